//! Integrity verification of downloaded attachments.

use crate::classify::ClassifiedAsset;
use crate::error::{Result, UpdateError};
use crate::manifest::ChecksumManifest;
use camino::Utf8Path;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;

/// Read buffer size used while hashing.
pub const CHUNK_SIZE: usize = 8192;

/// Compute the SHA-256 digest of a file as lowercase hex.
///
/// The whole file is always read, in chunks of [`CHUNK_SIZE`] bytes.
///
/// # Errors
///
/// Returns [`UpdateError::Io`] if the file cannot be read.
pub fn compute_sha256(path: &Utf8Path) -> Result<String> {
    let io_error = |source| UpdateError::Io {
        path: path.to_owned(),
        source,
    };
    let mut file = fs::File::open(path).map_err(io_error)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; CHUNK_SIZE];
    loop {
        let bytes_read = file.read(&mut buffer).map_err(io_error)?;
        match buffer.get(..bytes_read) {
            Some([]) | None => break,
            Some(chunk) => hasher.update(chunk),
        }
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Check a fetched attachment against its declared size and manifest digest.
///
/// # Errors
///
/// Returns [`UpdateError::SizeMismatch`] when the local length differs from
/// the declared size, [`UpdateError::ChecksumMismatch`] when the digest
/// differs or the manifest has no entry for the file, and
/// [`UpdateError::Io`] when the file cannot be read.
pub fn verify_asset(dir: &Utf8Path, asset: &ClassifiedAsset, manifest: &ChecksumManifest) -> Result<()> {
    let path = dir.join(asset.filename());
    let actual_size = fs::metadata(&path)
        .map_err(|source| UpdateError::Io {
            path: path.clone(),
            source,
        })?
        .len();
    if actual_size != asset.declared_size() {
        return Err(UpdateError::SizeMismatch {
            filename: asset.filename().to_owned(),
            expected: asset.declared_size(),
            actual: actual_size,
        });
    }

    let actual = compute_sha256(&path)?;
    let expected = manifest.digest_for(asset.filename());
    if expected != Some(actual.as_str()) {
        return Err(UpdateError::ChecksumMismatch {
            filename: asset.filename().to_owned(),
            expected: expected.map(str::to_owned),
            actual,
        });
    }

    log::info!("Verified {} ({actual})", asset.filename());
    Ok(())
}
