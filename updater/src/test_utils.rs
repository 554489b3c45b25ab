//! Shared test utilities for the updater crate.

use crate::download::{AssetDownloader, DownloadError};
use crate::release::{AttachmentRecord, ReleaseRecord};
use camino::Utf8Path;
use chrono::DateTime;
use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Write};

/// Base URL every fake attachment is served from.
pub const ASSET_BASE_URL: &str = "https://example.test";

/// Metadata document packed into the fake `lx` archive.
pub const MAME_XML: &[u8] = b"<?xml version=\"1.0\"?>\n<mame build=\"0.219\"></mame>\n";

/// Lowercase hex SHA-256 of `data`.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Build a ZIP archive in memory from `(name, content)` pairs.
///
/// # Panics
///
/// Panics if the archive cannot be written.
#[must_use]
#[expect(clippy::expect_used, reason = "test fixtures fail loudly")]
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, content) in entries {
        writer.start_file(*name, options).expect("start zip entry");
        writer.write_all(content).expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

/// Write a ZIP archive built by [`zip_bytes`] to `path`.
///
/// # Panics
///
/// Panics if the file cannot be written.
#[expect(clippy::expect_used, reason = "test fixtures fail loudly")]
pub fn write_zip(path: &Utf8Path, entries: &[(&str, &[u8])]) {
    std::fs::write(path, zip_bytes(entries)).expect("write zip archive");
}

/// Render a `sha256sum`-style manifest covering `files`.
#[must_use]
pub fn sha256_manifest(files: &[(&str, &[u8])]) -> Vec<u8> {
    files
        .iter()
        .map(|(name, content)| format!("{} *{name}\n", sha256_hex(content)))
        .collect::<String>()
        .into_bytes()
}

/// The attachments of a well-formed MAME 0.219 release, with a manifest
/// matching the other files.
#[must_use]
pub fn mame_release_files() -> Vec<(&'static str, Vec<u8>)> {
    let binary = b"MZ mame0219 64-bit build".to_vec();
    let source = b"MZ mame0219 self-extracting source".to_vec();
    let archive = zip_bytes(&[("mame0219.xml", MAME_XML)]);
    let manifest = sha256_manifest(&[
        ("mame0219b_64bit.exe", binary.as_slice()),
        ("mame0219lx.zip", archive.as_slice()),
        ("mame0219s.exe", source.as_slice()),
    ]);
    vec![
        ("mame0219b_64bit.exe", binary),
        ("mame0219s.exe", source),
        ("mame0219lx.zip", archive),
        ("SHA256SUMS", manifest),
    ]
}

/// Build a published release whose attachments are served by the returned
/// [`StubDownloader`].
#[must_use]
pub fn fake_release(files: Vec<(&str, Vec<u8>)>) -> (ReleaseRecord, StubDownloader) {
    let mut downloader = StubDownloader::new();
    let mut assets = Vec::with_capacity(files.len());
    for (name, content) in files {
        let url = format!("{ASSET_BASE_URL}/{name}");
        assets.push(AttachmentRecord {
            name: name.to_owned(),
            size: content.len() as u64,
            browser_download_url: url.clone(),
            content_type: "application/octet-stream".to_owned(),
        });
        downloader = downloader.with_body(&url, content);
    }
    let release = ReleaseRecord {
        name: Some("MAME 0.219".to_owned()),
        tag_name: "mame0219".to_owned(),
        html_url: "https://github.com/mamedev/mame/releases/tag/mame0219".to_owned(),
        draft: false,
        prerelease: false,
        created_at: None,
        // 2020-03-31T12:00:00Z
        published_at: DateTime::from_timestamp(1_585_656_000, 0),
        assets,
    };
    (release, downloader)
}

/// An [`AssetDownloader`] serving fixed bodies from memory.
///
/// Records every requested URL and the total number of bytes written so
/// tests can assert that no transfer happened.
#[derive(Debug, Default)]
pub struct StubDownloader {
    bodies: HashMap<String, Vec<u8>>,
    failing: HashSet<String>,
    requested: RefCell<Vec<String>>,
    served: RefCell<u64>,
}

impl StubDownloader {
    /// Creates a downloader that serves nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`.
    #[must_use]
    pub fn with_body(mut self, url: &str, body: Vec<u8>) -> Self {
        self.bodies.insert(url.to_owned(), body);
        self
    }

    /// Fail every request for `url` with a connection error.
    #[must_use]
    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_owned());
        self
    }

    /// URLs requested so far, in order.
    #[must_use]
    pub fn requested(&self) -> Vec<String> {
        self.requested.borrow().clone()
    }

    /// Total bytes written to sinks so far.
    #[must_use]
    pub fn bytes_served(&self) -> u64 {
        *self.served.borrow()
    }
}

impl AssetDownloader for StubDownloader {
    fn download(&self, url: &str, sink: &mut dyn Write) -> Result<u64, DownloadError> {
        self.requested.borrow_mut().push(url.to_owned());
        if self.failing.contains(url) {
            return Err(DownloadError::HttpError {
                url: url.to_owned(),
                reason: "connection refused".to_owned(),
            });
        }
        let body = self.bodies.get(url).ok_or_else(|| DownloadError::NotFound {
            url: url.to_owned(),
        })?;
        sink.write_all(body)?;
        let written = body.len() as u64;
        *self.served.borrow_mut() += written;
        Ok(written)
    }
}
