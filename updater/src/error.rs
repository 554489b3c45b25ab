//! Error types for the MAME updater.
//!
//! Every variant is fatal for the run. Messages name the offending file and,
//! where a comparison failed, both the expected and the actual value so the
//! single fatal line printed by the binary is enough to diagnose the failure.

use crate::classify::AssetRole;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur while fetching, verifying, or staging a release.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// The release listing could not be retrieved or decoded.
    #[error("release query to {url} failed: {reason}")]
    ReleaseQuery {
        /// The listing URL that was requested.
        url: String,
        /// Description of the transport or decoding failure.
        reason: String,
    },

    /// The release listing contained no releases.
    #[error("no releases found")]
    EmptyReleaseList,

    /// One or more required attachments were absent from the release.
    #[error("release {release} is missing required assets: {}", format_roles(.missing))]
    MissingRequiredAsset {
        /// Display name of the release that was scanned.
        release: String,
        /// Every role that no attachment matched.
        missing: Vec<AssetRole>,
    },

    /// Downloading an attachment failed.
    #[error("failed to download {filename}: {reason}")]
    TransferError {
        /// Name of the attachment being downloaded.
        filename: String,
        /// Description of the I/O or network failure.
        reason: String,
    },

    /// The number of bytes written differs from the declared attachment size.
    #[error("expected to download {expected} bytes of {filename}, but got {actual}")]
    TransferSizeMismatch {
        /// Name of the attachment being downloaded.
        filename: String,
        /// Size declared by the release listing.
        expected: u64,
        /// Number of bytes actually written.
        actual: u64,
    },

    /// A local file does not have the declared attachment size.
    #[error("size mismatch for {filename}: expected {expected} bytes, found {actual}")]
    SizeMismatch {
        /// Name of the local file.
        filename: String,
        /// Size declared by the release listing.
        expected: u64,
        /// Size found on disk.
        actual: u64,
    },

    /// A local file's digest disagrees with the checksum manifest.
    #[error(
        "checksum mismatch for {filename}: expected {}, actual {actual}",
        .expected.as_deref().unwrap_or("<no manifest entry>")
    )]
    ChecksumMismatch {
        /// Name of the verified file.
        filename: String,
        /// Digest listed in the manifest, if the file was listed at all.
        expected: Option<String>,
        /// Digest computed from the local file.
        actual: String,
    },

    /// A non-blank manifest line could not be split into digest and filename.
    #[error("malformed checksum manifest line {line_number}: {line:?}")]
    MalformedManifestLine {
        /// One-based line number within the manifest.
        line_number: usize,
        /// The offending line as read.
        line: String,
    },

    /// The manifest lists one filename with two different digests.
    #[error("checksum manifest line {line_number} gives a second digest for {filename}")]
    ConflictingManifestEntry {
        /// One-based line number of the second entry.
        line_number: usize,
        /// The filename listed twice.
        filename: String,
    },

    /// The checksum manifest could not be read.
    #[error("failed to read checksum manifest {path}: {source}")]
    ManifestUnreadable {
        /// Path to the manifest file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A local file could not be inspected or read.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path to the file being accessed.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The archive could not be opened or an entry could not be extracted.
    #[error("failed to read archive {archive}: {reason}")]
    ArchiveUnreadable {
        /// Path to the archive.
        archive: Utf8PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// No archive entry carries the wanted extension.
    #[error("archive {archive} contains no .{extension} entry")]
    NoMatchingEntry {
        /// Path to the archive.
        archive: Utf8PathBuf,
        /// The extension that was searched for.
        extension: String,
    },

    /// More than one archive entry carries the wanted extension.
    #[error("archive {archive} contains several candidate entries: {}", .entries.join(", "))]
    AmbiguousArchiveEntry {
        /// Path to the archive.
        archive: Utf8PathBuf,
        /// Names of every matching entry.
        entries: Vec<String>,
    },

    /// Copying a file to its staged name failed.
    #[error("failed to stage {source_path} as {destination}: {source}")]
    StageError {
        /// Path of the file being staged.
        source_path: Utf8PathBuf,
        /// The fixed destination path.
        destination: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A staged name would overwrite another file of the run.
    #[error("staged name {destination} would overwrite {occupant}")]
    StagingConflict {
        /// The configured destination name.
        destination: String,
        /// The downloaded or extracted file already using that name.
        occupant: String,
    },

    /// The configuration file is unreadable or invalid.
    #[error("invalid configuration {path}: {reason}")]
    Config {
        /// Path of the configuration source.
        path: Utf8PathBuf,
        /// Description of the problem.
        reason: String,
    },
}

fn format_roles(roles: &[AssetRole]) -> String {
    roles
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias using [`UpdateError`].
pub type Result<T> = std::result::Result<T, UpdateError>;
