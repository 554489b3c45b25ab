//! Update pipeline orchestration.
//!
//! Runs the stages in a fixed order: list releases, select the latest,
//! classify and fetch its attachments, parse the checksum manifest, verify the
//! executable and then the metadata archive, extract the metadata document,
//! and stage both outputs. The first failure ends the run; files already
//! written stay on disk.

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};

use crate::classify::{SelectedAssets, classify_and_fetch};
use crate::config::{StagedNames, UpdaterConfig};
use crate::download::AssetDownloader;
use crate::error::{Result, UpdateError};
use crate::extract::extract_single;
use crate::fetch::Fetcher;
use crate::manifest::ChecksumManifest;
use crate::release::{ReleaseSource, select_latest};
use crate::stage::Stager;
use crate::verify::verify_asset;

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    /// Display name of the installed release.
    pub release_name: String,
    /// Tag of the installed release.
    pub tag: String,
    /// When the release was published.
    pub published_at: Option<DateTime<Utc>>,
    /// Path of the staged executable.
    pub staged_binary: Utf8PathBuf,
    /// Path of the staged metadata document.
    pub staged_document: Utf8PathBuf,
}

/// Fetch, verify, and stage the latest release into `dir`.
///
/// # Errors
///
/// Returns the first error raised by any stage, and
/// [`UpdateError::StagingConflict`] before anything is staged when a staged
/// name would overwrite a downloaded file or the extracted document.
pub fn run_update(
    config: &UpdaterConfig,
    dir: &Utf8Path,
    source: &dyn ReleaseSource,
    downloader: &dyn AssetDownloader,
) -> Result<UpdateReport> {
    log::info!("Checking releases");
    let releases = source.list_releases()?;
    let release = select_latest(&releases)?;
    let published = release
        .published_at
        .map_or_else(|| "unpublished".to_owned(), |at| format!("published at {at}"));
    log::info!("Latest release is {release}, {published}");

    let fetcher = Fetcher::new(dir, downloader);
    let assets = classify_and_fetch(release, &config.assets, &fetcher)?;

    let manifest = ChecksumManifest::load(&fetcher.local_path(&assets.manifest))?;
    log::debug!(
        "{} lists {} digests",
        assets.manifest.filename(),
        manifest.len()
    );
    verify_asset(dir, &assets.binary, &manifest)?;
    verify_asset(dir, &assets.archive, &manifest)?;

    let document = extract_single(
        &fetcher.local_path(&assets.archive),
        dir,
        &config.assets.document_extension,
    )?;
    let document_name = document
        .file_name()
        .ok_or_else(|| UpdateError::ArchiveUnreadable {
            archive: fetcher.local_path(&assets.archive),
            reason: format!("extracted to {document}, which has no file name"),
        })?;
    check_destinations(&config.staging, &assets, document_name)?;

    log::info!("Looks like a successful download. Saving.");
    let stager = Stager::new(dir, &config.assets.binary_extension);
    let staged_binary = stager.stage(assets.binary.filename(), &config.staging.binary_name)?;
    let staged_document = stager.stage(document_name, &config.staging.document_name)?;

    Ok(UpdateReport {
        release_name: release.display_name().to_owned(),
        tag: release.tag_name.clone(),
        published_at: release.published_at,
        staged_binary,
        staged_document,
    })
}

/// Refuse staged names that would overwrite a downloaded or extracted file.
///
/// A staged name equal to the file it is copied from is allowed; staging
/// then only adjusts permissions.
fn check_destinations(
    staging: &StagedNames,
    assets: &SelectedAssets,
    document_name: &str,
) -> Result<()> {
    let occupants = [
        (assets.binary.filename(), assets.binary.role.to_string()),
        (assets.archive.filename(), assets.archive.role.to_string()),
        (assets.manifest.filename(), assets.manifest.role.to_string()),
        (document_name, "metadata document".to_owned()),
    ];
    let destinations = [
        (staging.binary_name.as_str(), assets.binary.filename()),
        (staging.document_name.as_str(), document_name),
    ];

    for (destination, source) in destinations {
        if destination == source {
            continue;
        }
        if let Some((name, label)) = occupants.iter().find(|(name, _)| *name == destination) {
            return Err(UpdateError::StagingConflict {
                destination: destination.to_owned(),
                occupant: format!("{name} ({label})"),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
