//! Release records and latest-release selection.
//!
//! Records mirror the GitHub releases API. Only the fields the updater reads
//! are declared; the rest of the payload is ignored during deserialization.

use crate::error::{Result, UpdateError};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;

/// One published release of the project.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ReleaseRecord {
    /// Human-readable title. Drafts and some tags leave it unset.
    #[serde(default)]
    pub name: Option<String>,
    /// Git tag the release was cut from.
    pub tag_name: String,
    /// Release page on the hosting service.
    #[serde(default)]
    pub html_url: String,
    /// Whether the release is an unpublished draft.
    #[serde(default)]
    pub draft: bool,
    /// Whether the release is flagged as a prerelease.
    #[serde(default)]
    pub prerelease: bool,
    /// When the release was created.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// When the release was published. `None` for drafts.
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// Attachments in listing order.
    #[serde(default)]
    pub assets: Vec<AttachmentRecord>,
}

impl ReleaseRecord {
    /// The release title, falling back to the tag when no title is set.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.tag_name)
    }
}

impl fmt::Display for ReleaseRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One downloadable file attached to a release.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct AttachmentRecord {
    /// Filename, unique within its release.
    pub name: String,
    /// Declared size in bytes.
    pub size: u64,
    /// Direct download URL.
    pub browser_download_url: String,
    /// MIME type hint supplied by the uploader.
    #[serde(default)]
    pub content_type: String,
}

/// A source of release records.
///
/// The HTTP implementation lives in [`crate::download::HttpClient`]; tests
/// substitute mocks.
#[cfg_attr(test, mockall::automock)]
pub trait ReleaseSource {
    /// Return every release of the project, in listing order.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::ReleaseQuery`] if the listing cannot be fetched
    /// or decoded.
    fn list_releases(&self) -> Result<Vec<ReleaseRecord>>;
}

/// Decode a releases API response body.
///
/// # Errors
///
/// Returns [`UpdateError::ReleaseQuery`] naming `url` when the body is not a
/// JSON array of releases.
pub fn parse_releases(json: &str, url: &str) -> Result<Vec<ReleaseRecord>> {
    serde_json::from_str(json).map_err(|e| UpdateError::ReleaseQuery {
        url: url.to_owned(),
        reason: format!("unexpected response body: {e}"),
    })
}

/// Pick the release with the latest publish time.
///
/// A candidate replaces the running best only when it was published strictly
/// after it, so the first of several equally recent releases is kept. A
/// release without a publish time never beats one that has one.
///
/// # Errors
///
/// Returns [`UpdateError::EmptyReleaseList`] when `releases` is empty.
///
/// # Examples
///
/// ```
/// use mame_updater::release::{select_latest, ReleaseRecord};
///
/// let releases: Vec<ReleaseRecord> = serde_json::from_str(r#"[
///     {"tag_name": "mame0218", "published_at": "2020-02-26T12:00:00Z"},
///     {"tag_name": "mame0219", "published_at": "2020-03-31T12:00:00Z"}
/// ]"#).unwrap();
/// assert_eq!(select_latest(&releases).unwrap().tag_name, "mame0219");
/// ```
pub fn select_latest(releases: &[ReleaseRecord]) -> Result<&ReleaseRecord> {
    let (first, rest) = releases
        .split_first()
        .ok_or(UpdateError::EmptyReleaseList)?;
    Ok(rest.iter().fold(first, |best, candidate| {
        if candidate.published_at > best.published_at {
            candidate
        } else {
            best
        }
    }))
}
