//! Checksum manifest parsing.
//!
//! The manifest uses the `sha256sum` output format: one
//! `<hex-digest> <mode><filename>` entry per line, where the mode character
//! is `*` for binary mode or a space for text mode.

use crate::error::{Result, UpdateError};
use camino::Utf8Path;
use std::collections::HashMap;

/// Expected digests keyed by filename.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecksumManifest {
    entries: HashMap<String, String>,
}

impl ChecksumManifest {
    /// Read and parse the manifest at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::ManifestUnreadable`] if the file cannot be read
    /// and [`UpdateError::MalformedManifestLine`] for the first bad line.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| UpdateError::ManifestUnreadable {
            path: path.to_owned(),
            source,
        })?;
        Self::parse_str(&text)
    }

    /// Parse manifest text.
    ///
    /// Blank lines are skipped. Any other line without both a digest and a
    /// filename aborts the parse. Digests are stored lowercase. A filename may
    /// repeat only with the same digest.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::MalformedManifestLine`] for the first bad line
    /// and [`UpdateError::ConflictingManifestEntry`] when a filename is
    /// listed again with a different digest.
    ///
    /// # Examples
    ///
    /// ```
    /// use mame_updater::manifest::ChecksumManifest;
    ///
    /// let manifest = ChecksumManifest::parse_str("ABCD1234 *foo.zip\n").unwrap();
    /// assert_eq!(manifest.digest_for("foo.zip"), Some("abcd1234"));
    /// ```
    pub fn parse_str(text: &str) -> Result<Self> {
        let mut entries = HashMap::new();
        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let (digest, filename) = split_entry(line).ok_or_else(|| {
                UpdateError::MalformedManifestLine {
                    line_number: index + 1,
                    line: line.to_owned(),
                }
            })?;
            let normalised = digest.to_ascii_lowercase();
            if let Some(existing) = entries.get(filename) {
                if *existing != normalised {
                    return Err(UpdateError::ConflictingManifestEntry {
                        line_number: index + 1,
                        filename: filename.to_owned(),
                    });
                }
                log::debug!("{filename} is listed twice with the same digest");
                continue;
            }
            entries.insert(filename.to_owned(), normalised);
        }
        Ok(Self { entries })
    }

    /// The expected digest for `filename`, if listed.
    #[must_use]
    pub fn digest_for(&self, filename: &str) -> Option<&str> {
        self.entries.get(filename).map(String::as_str)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest lists no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Split a line on its first space and drop one leading mode marker from the
/// filename.
fn split_entry(line: &str) -> Option<(&str, &str)> {
    let (digest, rest) = line.split_once(' ')?;
    let filename = rest
        .strip_prefix('*')
        .or_else(|| rest.strip_prefix(' '))
        .unwrap_or(rest);
    (!digest.is_empty() && !filename.is_empty()).then_some((digest, filename))
}
