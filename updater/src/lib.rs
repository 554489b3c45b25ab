//! MAME updater library.
//!
//! This crate fetches the newest MAME release from the project's release
//! listing, verifies the downloaded executable and metadata archive against
//! the published `SHA256SUMS` manifest, extracts the metadata document, and
//! stages both under fixed names. It is used by the `mame-updater` CLI binary
//! and can be driven programmatically with substitute release sources and
//! downloaders.
//!
//! # Modules
//!
//! - [`classify`] - Attachment roles and interleaved classify-and-fetch
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - TOML configuration and naming defaults
//! - [`download`] - HTTP transport for release listings and attachments
//! - [`error`] - Semantic error types for every pipeline failure
//! - [`extract`] - Single-entry extraction from the metadata archive
//! - [`fetch`] - Size-checked, skip-if-present attachment downloads
//! - [`manifest`] - `SHA256SUMS` manifest parsing
//! - [`pipeline`] - End-to-end update orchestration
//! - [`release`] - Release records and latest-release selection
//! - [`stage`] - Copying outputs to fixed names with fixed permissions
//! - [`verify`] - Size and SHA-256 integrity checks

pub mod classify;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod manifest;
pub mod pipeline;
pub mod release;
pub mod stage;
pub mod verify;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
