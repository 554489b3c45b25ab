//! Unit tests for the update pipeline.

use super::*;
use crate::classify::AssetRole;
use crate::error::UpdateError;
use crate::release::{MockReleaseSource, ReleaseRecord};
use crate::test_utils::{MAME_XML, StubDownloader, fake_release, mame_release_files};
use rstest::rstest;
use std::fs;

struct Workspace {
    _temp: tempfile::TempDir,
    dir: Utf8PathBuf,
}

fn new_workspace() -> Workspace {
    let temp = tempfile::tempdir().expect("temp dir");
    let dir = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 path");
    Workspace { _temp: temp, dir }
}

fn source_returning(releases: Vec<ReleaseRecord>) -> MockReleaseSource {
    let mut source = MockReleaseSource::new();
    source
        .expect_list_releases()
        .returning(move || Ok(releases.clone()));
    source
}

fn file_mode(path: &Utf8Path) -> u32 {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::metadata(path).expect("metadata").permissions().mode() & 0o777
    }
    #[cfg(not(unix))]
    {
        let _ = path;
        0
    }
}

#[test]
fn stages_binary_and_document() {
    let workspace = new_workspace();
    let (release, downloader) = fake_release(mame_release_files());
    let source = source_returning(vec![release]);

    let report = run_update(&UpdaterConfig::default(), &workspace.dir, &source, &downloader)
        .expect("update succeeds");

    assert_eq!(report.tag, "mame0219");
    assert_eq!(report.release_name, "MAME 0.219");
    assert_eq!(report.staged_binary, workspace.dir.join("mame.exe"));
    assert_eq!(report.staged_document, workspace.dir.join("mame.xml"));
    assert_eq!(
        fs::read(&report.staged_binary).expect("read binary"),
        fs::read(workspace.dir.join("mame0219b_64bit.exe")).expect("read download")
    );
    assert_eq!(fs::read(&report.staged_document).expect("read document"), MAME_XML);
    assert!(workspace.dir.join("mame0219.xml").exists());
    assert!(
        !workspace.dir.join("mame0219s.exe").exists(),
        "ignored attachments are never fetched"
    );
    if cfg!(unix) {
        assert_eq!(file_mode(&report.staged_binary), 0o775);
        assert_eq!(file_mode(&report.staged_document), 0o664);
    }
}

#[test]
fn second_run_transfers_nothing() {
    let workspace = new_workspace();
    let (release, downloader) = fake_release(mame_release_files());
    let source = source_returning(vec![release]);
    let config = UpdaterConfig::default();

    run_update(&config, &workspace.dir, &source, &downloader).expect("first run");
    let served = downloader.bytes_served();
    assert!(served > 0);

    run_update(&config, &workspace.dir, &source, &downloader).expect("second run");
    assert_eq!(downloader.bytes_served(), served);
}

#[test]
fn newest_release_wins() {
    let workspace = new_workspace();
    let (latest, downloader) = fake_release(mame_release_files());
    let mut older = latest.clone();
    older.tag_name = "mame0218".to_owned();
    older.name = Some("MAME 0.218".to_owned());
    older.published_at = Some("2020-02-25T12:00:00Z".parse().expect("timestamp"));
    older.assets.clear();
    let source = source_returning(vec![older, latest]);

    let report = run_update(&UpdaterConfig::default(), &workspace.dir, &source, &downloader)
        .expect("update succeeds");
    assert_eq!(report.tag, "mame0219");
}

#[test]
fn empty_listing_fails() {
    let workspace = new_workspace();
    let source = source_returning(Vec::new());
    let downloader = StubDownloader::new();

    let err = run_update(&UpdaterConfig::default(), &workspace.dir, &source, &downloader)
        .expect_err("no releases");
    assert!(matches!(err, UpdateError::EmptyReleaseList));
    assert!(downloader.requested().is_empty());
}

#[test]
fn listing_failure_is_propagated() {
    let workspace = new_workspace();
    let mut source = MockReleaseSource::new();
    source.expect_list_releases().returning(|| {
        Err(UpdateError::ReleaseQuery {
            url: "https://example.test/releases".to_owned(),
            reason: "HTTP status 503".to_owned(),
        })
    });

    let err = run_update(
        &UpdaterConfig::default(),
        &workspace.dir,
        &source,
        &StubDownloader::new(),
    )
    .expect_err("listing fails");
    assert!(matches!(err, UpdateError::ReleaseQuery { .. }));
}

#[test]
fn missing_manifest_is_reported() {
    let workspace = new_workspace();
    let files = mame_release_files()
        .into_iter()
        .filter(|(name, _)| *name != "SHA256SUMS")
        .collect();
    let (release, downloader) = fake_release(files);
    let source = source_returning(vec![release]);

    let err = run_update(&UpdaterConfig::default(), &workspace.dir, &source, &downloader)
        .expect_err("missing manifest");
    match err {
        UpdateError::MissingRequiredAsset { missing, .. } => {
            assert_eq!(missing, vec![AssetRole::ChecksumManifest]);
        }
        other => panic!("expected MissingRequiredAsset, got {other:?}"),
    }
    assert!(!workspace.dir.join("mame.exe").exists());
}

#[test]
fn tampered_binary_stops_before_staging() {
    let workspace = new_workspace();
    let files = mame_release_files()
        .into_iter()
        .map(|(name, content)| {
            if name == "mame0219b_64bit.exe" {
                // Same length, different bytes.
                let tampered = content.iter().map(|b| b ^ 0xff).collect();
                (name, tampered)
            } else {
                (name, content)
            }
        })
        .collect();
    let (release, downloader) = fake_release(files);
    let source = source_returning(vec![release]);

    let err = run_update(&UpdaterConfig::default(), &workspace.dir, &source, &downloader)
        .expect_err("checksum mismatch");
    match err {
        UpdateError::ChecksumMismatch { filename, .. } => {
            assert_eq!(filename, "mame0219b_64bit.exe");
        }
        other => panic!("expected ChecksumMismatch, got {other:?}"),
    }
    assert!(!workspace.dir.join("mame.exe").exists());
    assert!(!workspace.dir.join("mame.xml").exists());
    assert!(
        !workspace.dir.join("mame0219.xml").exists(),
        "extraction follows verification"
    );
}

#[test]
fn custom_staged_names_are_used() {
    let workspace = new_workspace();
    let (release, downloader) = fake_release(mame_release_files());
    let source = source_returning(vec![release]);
    let mut config = UpdaterConfig::default();
    config.staging.binary_name = "emulator.exe".to_owned();
    config.staging.document_name = "catalogue.xml".to_owned();

    let report =
        run_update(&config, &workspace.dir, &source, &downloader).expect("update succeeds");
    assert_eq!(report.staged_binary, workspace.dir.join("emulator.exe"));
    assert_eq!(report.staged_document, workspace.dir.join("catalogue.xml"));
    assert!(!workspace.dir.join("mame.exe").exists());
}

#[rstest]
#[case::document_over_binary("mame.exe", "mame0219b_64bit.exe", "mame0219b_64bit.exe")]
#[case::binary_over_archive("mame0219lx.zip", "mame.xml", "mame0219lx.zip")]
#[case::binary_over_manifest("SHA256SUMS", "mame.xml", "SHA256SUMS")]
#[case::binary_over_document("mame0219.xml", "mame.xml", "mame0219.xml")]
#[case::document_over_manifest("mame.exe", "SHA256SUMS", "SHA256SUMS")]
fn staged_name_never_overwrites_run_files(
    #[case] binary_name: &str,
    #[case] document_name: &str,
    #[case] destination: &str,
) {
    let workspace = new_workspace();
    let files = mame_release_files();
    let original_binary = files
        .iter()
        .find(|(name, _)| *name == "mame0219b_64bit.exe")
        .map(|(_, content)| content.clone())
        .expect("binary in release");
    let (release, downloader) = fake_release(files);
    let source = source_returning(vec![release]);
    let mut config = UpdaterConfig::default();
    config.staging.binary_name = binary_name.to_owned();
    config.staging.document_name = document_name.to_owned();

    let err = run_update(&config, &workspace.dir, &source, &downloader)
        .expect_err("staged name collides with a run file");
    match err {
        UpdateError::StagingConflict {
            destination: found, ..
        } => assert_eq!(found, destination),
        other => panic!("expected StagingConflict, got {other:?}"),
    }
    assert_eq!(
        fs::read(workspace.dir.join("mame0219b_64bit.exe")).expect("read download"),
        original_binary
    );
    assert_eq!(
        fs::read(workspace.dir.join("mame0219.xml")).expect("read document"),
        MAME_XML
    );
}

#[test]
fn staging_a_file_onto_itself_is_allowed() {
    let workspace = new_workspace();
    let (release, downloader) = fake_release(mame_release_files());
    let source = source_returning(vec![release]);
    let mut config = UpdaterConfig::default();
    config.staging.binary_name = "mame0219b_64bit.exe".to_owned();
    config.staging.document_name = "mame0219.xml".to_owned();

    let report =
        run_update(&config, &workspace.dir, &source, &downloader).expect("update succeeds");
    assert_eq!(report.staged_binary, workspace.dir.join("mame0219b_64bit.exe"));
    assert_eq!(fs::read(&report.staged_document).expect("read document"), MAME_XML);
    assert!(!workspace.dir.join("mame.exe").exists());
}
