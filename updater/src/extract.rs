//! Extraction of the metadata document from its ZIP container.
//!
//! Only one entry is ever extracted. It is written under its own file name in
//! the destination directory; entries whose paths would escape the archive
//! root are refused.

use crate::error::{Result, UpdateError};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io::BufWriter;
use std::path::Path;

/// Extract the single entry of `archive` whose name has `extension`.
///
/// Returns the path of the written file.
///
/// # Errors
///
/// Returns [`UpdateError::NoMatchingEntry`] when no entry matches,
/// [`UpdateError::AmbiguousArchiveEntry`] when several do, and
/// [`UpdateError::ArchiveUnreadable`] if the archive cannot be read or the
/// entry cannot be written.
pub fn extract_single(archive: &Utf8Path, dest_dir: &Utf8Path, extension: &str) -> Result<Utf8PathBuf> {
    let unreadable = |reason: String| UpdateError::ArchiveUnreadable {
        archive: archive.to_owned(),
        reason,
    };

    let file = fs::File::open(archive).map_err(|e| unreadable(e.to_string()))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| unreadable(e.to_string()))?;

    let mut candidates: Vec<(usize, String)> = Vec::new();
    for index in 0..zip.len() {
        let entry = zip.by_index(index).map_err(|e| unreadable(e.to_string()))?;
        if !entry.is_dir() && has_extension(entry.name(), extension) {
            candidates.push((index, entry.name().to_owned()));
        }
    }

    let index = match candidates.as_slice() {
        [] => {
            return Err(UpdateError::NoMatchingEntry {
                archive: archive.to_owned(),
                extension: extension.to_owned(),
            });
        }
        [(index, _)] => *index,
        _ => {
            return Err(UpdateError::AmbiguousArchiveEntry {
                archive: archive.to_owned(),
                entries: candidates.into_iter().map(|(_, name)| name).collect(),
            });
        }
    };

    let mut entry = zip.by_index(index).map_err(|e| unreadable(e.to_string()))?;
    let file_name = entry
        .enclosed_name()
        .as_deref()
        .and_then(Path::file_name)
        .and_then(|name| name.to_str())
        .map(str::to_owned)
        .ok_or_else(|| unreadable(format!("unsafe entry path {}", entry.name())))?;

    let dest = dest_dir.join(&file_name);
    log::info!("Extracting {file_name} from {archive}");
    let out = fs::File::create(&dest).map_err(|e| unreadable(format!("cannot create {dest}: {e}")))?;
    let mut writer = BufWriter::new(out);
    let written = std::io::copy(&mut entry, &mut writer)
        .map_err(|e| unreadable(format!("cannot extract {file_name}: {e}")))?;
    writer
        .into_inner()
        .map_err(|e| unreadable(format!("cannot write {dest}: {}", e.error())))?;
    log::trace!("extracted {written} bytes to {dest}");

    Ok(dest)
}

/// Whether an archive entry name ends in `.{extension}`.
fn has_extension(name: &str, extension: &str) -> bool {
    Utf8Path::new(name).extension() == Some(extension)
}
