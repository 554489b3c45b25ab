//! HTTP transport for release listings and attachment downloads.
//!
//! [`HttpClient`] owns the `ureq` agent for one run and is handed to the
//! pipeline explicitly. The [`AssetDownloader`] trait keeps the fetcher
//! independent of the network so tests can serve bytes from memory.

use crate::error::{Result, UpdateError};
use crate::release::{ReleaseRecord, ReleaseSource, parse_releases};
use std::io::Write;
use std::time::Duration;

/// Identifies the updater to the release-hosting service, which rejects
/// anonymous clients.
const USER_AGENT: &str = concat!("mame-updater/", env!("CARGO_PKG_VERSION"));

/// Media type requested from the releases API.
const GITHUB_JSON: &str = "application/vnd.github+json";

/// Trait for streaming an attachment's bytes into a sink.
pub trait AssetDownloader {
    /// Download `url` and write the body to `sink`.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the sink cannot be written.
    fn download(&self, url: &str, sink: &mut dyn Write) -> std::result::Result<u64, DownloadError>;
}

/// Errors arising from HTTP transfers.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// HTTP request failed.
    #[error("download failed for {url}: {reason}")]
    HttpError {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The requested resource was not found (HTTP 404).
    #[error("not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// I/O error writing the downloaded body.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),
}

/// `ureq`-backed client for one updater run.
pub struct HttpClient {
    agent: ureq::Agent,
    releases_url: String,
}

impl HttpClient {
    /// Build a client for `releases_url`.
    ///
    /// `timeout` bounds each whole request; `None` keeps the `ureq` default.
    #[must_use]
    pub fn new(releases_url: &str, timeout: Option<Duration>) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(timeout)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            releases_url: releases_url.to_owned(),
        }
    }
}

impl ReleaseSource for HttpClient {
    fn list_releases(&self) -> Result<Vec<ReleaseRecord>> {
        let url = self.releases_url.as_str();
        let query_error = |reason: String| UpdateError::ReleaseQuery {
            url: url.to_owned(),
            reason,
        };

        log::debug!("querying {url}");
        let response = self
            .agent
            .get(url)
            .header("Accept", GITHUB_JSON)
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| query_error(map_ureq_error(url, &e).to_string()))?;
        let body = response
            .into_body()
            .read_to_string()
            .map_err(|e| query_error(e.to_string()))?;

        log::trace!("release listing returned {} bytes", body.len());
        parse_releases(&body, url)
    }
}

impl AssetDownloader for HttpClient {
    fn download(&self, url: &str, sink: &mut dyn Write) -> std::result::Result<u64, DownloadError> {
        let response = self
            .agent
            .get(url)
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        let mut reader = response.into_body().into_reader();
        let written = std::io::copy(&mut reader, sink)?;
        Ok(written)
    }
}

/// Map a ureq error to a [`DownloadError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(404) => DownloadError::NotFound {
            url: url.to_owned(),
        },
        other => DownloadError::HttpError {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}
