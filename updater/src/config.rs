//! Updater configuration.
//!
//! Settings live in an optional `mame-updater.toml` inside the working
//! directory. Every key falls back to the defaults used for the official MAME
//! releases, so an absent file, or a file that only overrides a single key,
//! behaves the same as the built-in configuration. Command-line flags are
//! applied on top by [`UpdaterConfig::apply_overrides`].

use crate::error::{Result, UpdateError};
use camino::Utf8Path;
use serde::Deserialize;
use std::time::Duration;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "mame-updater.toml";

/// Release listing for the MAME project.
pub const DEFAULT_RELEASES_URL: &str = "https://api.github.com/repos/mamedev/mame/releases";

/// Complete updater configuration.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct UpdaterConfig {
    /// URL returning the JSON array of releases.
    pub releases_url: String,
    /// Global request timeout in seconds. `None` keeps the transport default.
    pub timeout_secs: Option<u64>,
    /// Filename patterns used to classify release attachments.
    pub assets: AssetPatterns,
    /// Fixed names the verified outputs are staged under.
    pub staging: StagedNames,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            releases_url: DEFAULT_RELEASES_URL.to_owned(),
            timeout_secs: None,
            assets: AssetPatterns::default(),
            staging: StagedNames::default(),
        }
    }
}

/// Filename patterns that decide each attachment's role.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AssetPatterns {
    /// Extension of the platform executable, without the dot.
    pub binary_extension: String,
    /// Token the executable's stem must end with.
    pub binary_suffix: String,
    /// Extension of the metadata archive, without the dot.
    pub archive_extension: String,
    /// Token the metadata archive's stem must end with.
    pub archive_marker: String,
    /// Exact filename of the checksum manifest.
    pub manifest_name: String,
    /// Extension of the document extracted from the metadata archive.
    pub document_extension: String,
}

impl Default for AssetPatterns {
    fn default() -> Self {
        Self {
            binary_extension: "exe".to_owned(),
            binary_suffix: "_64bit".to_owned(),
            archive_extension: "zip".to_owned(),
            archive_marker: "lx".to_owned(),
            manifest_name: "SHA256SUMS".to_owned(),
            document_extension: "xml".to_owned(),
        }
    }
}

/// Canonical destination names for the staged outputs.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StagedNames {
    /// Destination of the primary executable.
    pub binary_name: String,
    /// Destination of the extracted metadata document.
    pub document_name: String,
}

impl Default for StagedNames {
    fn default() -> Self {
        Self {
            binary_name: "mame.exe".to_owned(),
            document_name: "mame.xml".to_owned(),
        }
    }
}

/// Values taken from the command line that override the file.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Replacement release listing URL.
    pub releases_url: Option<String>,
    /// Replacement timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl UpdaterConfig {
    /// Parse configuration from TOML text.
    ///
    /// `origin` is only used to label errors.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::Config`] when the text is not valid TOML, holds
    /// unknown keys, or fails [`Self::validate`].
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use mame_updater::config::UpdaterConfig;
    ///
    /// let text = "[staging]\nbinary_name = \"emulator.exe\"\n";
    /// let config = UpdaterConfig::from_toml(text, Utf8Path::new("inline")).unwrap();
    /// assert_eq!(config.staging.binary_name, "emulator.exe");
    /// assert_eq!(config.staging.document_name, "mame.xml");
    /// ```
    pub fn from_toml(text: &str, origin: &Utf8Path) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| UpdateError::Config {
            path: origin.to_owned(),
            reason: e.to_string(),
        })?;
        config.validate(origin)?;
        Ok(config)
    }

    /// Load configuration from `path`.
    ///
    /// When `required` is false a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::Config`] if the file cannot be read (or is
    /// missing while `required`), or if its contents are invalid.
    pub fn load(path: &Utf8Path, required: bool) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text, path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
                log::debug!("no configuration at {path}; using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(UpdateError::Config {
                path: path.to_owned(),
                reason: e.to_string(),
            }),
        }
    }

    /// Apply command-line overrides on top of the loaded values.
    #[must_use]
    pub fn apply_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(url) = &overrides.releases_url {
            self.releases_url.clone_from(url);
        }
        if overrides.timeout_secs.is_some() {
            self.timeout_secs = overrides.timeout_secs;
        }
        self
    }

    /// The configured request timeout, if any.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Check that every pattern token is usable and the staged names are
    /// distinct.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::Config`] describing the first violated rule.
    pub fn validate(&self, origin: &Utf8Path) -> Result<()> {
        let invalid = |reason: String| UpdateError::Config {
            path: origin.to_owned(),
            reason,
        };

        let required = [
            ("releases_url", self.releases_url.as_str()),
            ("assets.binary_extension", self.assets.binary_extension.as_str()),
            ("assets.binary_suffix", self.assets.binary_suffix.as_str()),
            ("assets.archive_extension", self.assets.archive_extension.as_str()),
            ("assets.archive_marker", self.assets.archive_marker.as_str()),
            ("assets.manifest_name", self.assets.manifest_name.as_str()),
            ("assets.document_extension", self.assets.document_extension.as_str()),
            ("staging.binary_name", self.staging.binary_name.as_str()),
            ("staging.document_name", self.staging.document_name.as_str()),
        ];
        if let Some((key, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(invalid(format!("{key} must not be empty")));
        }

        if self.timeout_secs == Some(0) {
            return Err(invalid("timeout_secs must be at least 1".to_owned()));
        }

        if self.staging.binary_name == self.staging.document_name {
            return Err(invalid(format!(
                "staging.binary_name and staging.document_name are both \"{}\"",
                self.staging.binary_name
            )));
        }

        for (key, name) in [
            ("staging.binary_name", &self.staging.binary_name),
            ("staging.document_name", &self.staging.document_name),
        ] {
            if name.contains(['/', '\\']) {
                return Err(invalid(format!("{key} must be a bare filename, got \"{name}\"")));
            }
        }

        Ok(())
    }
}
