//! Attachment fetching.
//!
//! A local file whose length already equals the declared attachment size is
//! reused without any network traffic. This is a size check only; the
//! integrity verifier is what catches a corrupted file of the right length.
//! Transfers are written to a temporary file in the working directory and
//! moved into place once the byte count is confirmed.

use crate::classify::ClassifiedAsset;
use crate::download::AssetDownloader;
use crate::error::{Result, UpdateError};
use camino::{Utf8Path, Utf8PathBuf};
use std::io::BufWriter;

const BYTES_PER_MIB: u64 = 1024 * 1024;

/// What [`Fetcher::fetch`] did for an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A local copy of the declared size already existed.
    AlreadyPresent,
    /// The attachment was transferred.
    Downloaded {
        /// Number of bytes written.
        bytes: u64,
    },
}

/// Downloads attachments into a working directory.
pub struct Fetcher<'a> {
    dir: Utf8PathBuf,
    downloader: &'a dyn AssetDownloader,
}

impl<'a> Fetcher<'a> {
    /// Create a fetcher writing into `dir`.
    #[must_use]
    pub fn new(dir: &Utf8Path, downloader: &'a dyn AssetDownloader) -> Self {
        Self {
            dir: dir.to_owned(),
            downloader,
        }
    }

    /// The local path an attachment is stored under.
    #[must_use]
    pub fn local_path(&self, asset: &ClassifiedAsset) -> Utf8PathBuf {
        self.dir.join(asset.filename())
    }

    /// Ensure the attachment exists locally with its declared size.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::TransferError`] on any network or I/O failure,
    /// and [`UpdateError::TransferSizeMismatch`] when the transfer's length
    /// differs from the declared size. Neither leaves a file under the
    /// attachment's name.
    pub fn fetch(&self, asset: &ClassifiedAsset) -> Result<FetchOutcome> {
        let path = self.local_path(asset);
        let expected = asset.declared_size();

        if local_size(&path) == Some(expected) {
            log::info!("{} already downloaded.", asset.filename());
            return Ok(FetchOutcome::AlreadyPresent);
        }

        log::info!(
            "Downloading {} ({}M)...",
            asset.filename(),
            expected.div_euclid(BYTES_PER_MIB)
        );
        let bytes = self.transfer(asset, &path)?;
        log::trace!("wrote {bytes} bytes to {path}");
        Ok(FetchOutcome::Downloaded { bytes })
    }

    fn transfer(&self, asset: &ClassifiedAsset, path: &Utf8Path) -> Result<u64> {
        let transfer_error = |reason: String| UpdateError::TransferError {
            filename: asset.filename().to_owned(),
            reason,
        };

        let staging_file = tempfile::NamedTempFile::new_in(&self.dir)
            .map_err(|e| transfer_error(format!("cannot create file in {}: {e}", self.dir)))?;
        let mut sink = BufWriter::new(staging_file);
        let written = self
            .downloader
            .download(&asset.attachment.browser_download_url, &mut sink)
            .map_err(|e| transfer_error(e.to_string()))?;
        let temp = sink
            .into_inner()
            .map_err(|e| transfer_error(e.error().to_string()))?;

        let expected = asset.declared_size();
        if written != expected {
            return Err(UpdateError::TransferSizeMismatch {
                filename: asset.filename().to_owned(),
                expected,
                actual: written,
            });
        }

        temp.as_file()
            .sync_all()
            .map_err(|e| transfer_error(e.to_string()))?;
        temp.persist(path)
            .map_err(|e| transfer_error(e.error.to_string()))?;
        Ok(written)
    }
}

/// Length of the file at `path`, or `None` if it cannot be inspected.
fn local_size(path: &Utf8Path) -> Option<u64> {
    std::fs::metadata(path)
        .ok()
        .filter(std::fs::Metadata::is_file)
        .map(|meta| meta.len())
}

impl std::fmt::Debug for Fetcher<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher").field("dir", &self.dir).finish_non_exhaustive()
    }
}
