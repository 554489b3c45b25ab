//! Attachment classification.
//!
//! Each attachment of the selected release is matched against the configured
//! [`AssetPatterns`] and given exactly one [`AssetRole`]. Classification and
//! download are interleaved: an attachment is fetched as soon as it claims a
//! role, so a later failure can leave earlier downloads on disk.

use crate::config::AssetPatterns;
use crate::error::{Result, UpdateError};
use crate::fetch::Fetcher;
use crate::release::{AttachmentRecord, ReleaseRecord};
use camino::Utf8Path;
use std::fmt;

/// The part an attachment plays in the update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetRole {
    /// The 64-bit platform executable.
    PrimaryBinary,
    /// The archive holding the metadata document.
    MetadataArchive,
    /// The checksum manifest covering the other attachments.
    ChecksumManifest,
    /// Anything the updater does not need.
    Ignored,
}

impl AssetRole {
    /// Roles every release must provide, in reporting order.
    pub const REQUIRED: [Self; 3] = [
        Self::PrimaryBinary,
        Self::MetadataArchive,
        Self::ChecksumManifest,
    ];
}

impl fmt::Display for AssetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::PrimaryBinary => "primary binary",
            Self::MetadataArchive => "metadata archive",
            Self::ChecksumManifest => "checksum manifest",
            Self::Ignored => "ignored",
        };
        f.write_str(label)
    }
}

/// An attachment tagged with its role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedAsset {
    /// The role the attachment matched.
    pub role: AssetRole,
    /// The attachment itself.
    pub attachment: AttachmentRecord,
}

impl ClassifiedAsset {
    /// The attachment's filename.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.attachment.name
    }

    /// The size declared by the release listing.
    #[must_use]
    pub const fn declared_size(&self) -> u64 {
        self.attachment.size
    }
}

/// The three attachments a run needs, each already fetched.
#[derive(Debug, Clone)]
pub struct SelectedAssets {
    /// The platform executable.
    pub binary: ClassifiedAsset,
    /// The metadata archive.
    pub archive: ClassifiedAsset,
    /// The checksum manifest.
    pub manifest: ClassifiedAsset,
}

impl AssetPatterns {
    /// Decide the role of a single filename.
    ///
    /// # Examples
    ///
    /// ```
    /// use mame_updater::classify::AssetRole;
    /// use mame_updater::config::AssetPatterns;
    ///
    /// let patterns = AssetPatterns::default();
    /// assert_eq!(patterns.classify("mame0219b_64bit.exe"), AssetRole::PrimaryBinary);
    /// assert_eq!(patterns.classify("mame0219s.exe"), AssetRole::Ignored);
    /// ```
    #[must_use]
    pub fn classify(&self, filename: &str) -> AssetRole {
        if filename == self.manifest_name {
            return AssetRole::ChecksumManifest;
        }

        let path = Utf8Path::new(filename);
        let (Some(stem), Some(extension)) = (path.file_stem(), path.extension()) else {
            return AssetRole::Ignored;
        };

        if extension == self.binary_extension
            && stem.len() > self.binary_suffix.len()
            && stem.ends_with(&self.binary_suffix)
        {
            AssetRole::PrimaryBinary
        } else if extension == self.archive_extension && stem.ends_with(&self.archive_marker) {
            AssetRole::MetadataArchive
        } else {
            AssetRole::Ignored
        }
    }
}

/// Classify the release's attachments in order, fetching each one that claims
/// a role.
///
/// The first attachment matching a role keeps it; later matches are logged and
/// skipped without being downloaded.
///
/// # Errors
///
/// Propagates any fetch failure immediately, and returns
/// [`UpdateError::MissingRequiredAsset`] naming every role still unfilled once
/// all attachments have been scanned.
pub fn classify_and_fetch(
    release: &ReleaseRecord,
    patterns: &AssetPatterns,
    fetcher: &Fetcher<'_>,
) -> Result<SelectedAssets> {
    let mut binary = None;
    let mut archive = None;
    let mut manifest = None;

    for attachment in &release.assets {
        let role = patterns.classify(&attachment.name);
        let slot = match role {
            AssetRole::PrimaryBinary => &mut binary,
            AssetRole::MetadataArchive => &mut archive,
            AssetRole::ChecksumManifest => &mut manifest,
            AssetRole::Ignored => {
                log::debug!("Skipping {}", attachment.name);
                continue;
            }
        };

        if let Some(kept) = slot.as_ref().map(ClassifiedAsset::filename) {
            log::warn!(
                "Ignoring {} as a second {role}; keeping {kept}",
                attachment.name
            );
            continue;
        }

        let asset = ClassifiedAsset {
            role,
            attachment: attachment.clone(),
        };
        fetcher.fetch(&asset)?;
        *slot = Some(asset);
    }

    match (binary, archive, manifest) {
        (Some(found_binary), Some(found_archive), Some(found_manifest)) => Ok(SelectedAssets {
            binary: found_binary,
            archive: found_archive,
            manifest: found_manifest,
        }),
        (partial_binary, partial_archive, partial_manifest) => {
            let present = [
                partial_binary.is_some(),
                partial_archive.is_some(),
                partial_manifest.is_some(),
            ];
            let missing = AssetRole::REQUIRED
                .into_iter()
                .zip(present)
                .filter_map(|(role, found)| (!found).then_some(role))
                .collect();
            Err(UpdateError::MissingRequiredAsset {
                release: release.display_name().to_owned(),
                missing,
            })
        }
    }
}
