//! MAME updater CLI entrypoint.
//!
//! This binary fetches the latest MAME release into a working directory,
//! verifies it, and stages `mame.exe` and `mame.xml`. Any failure is reported
//! as a single line on stderr and the process exits with status 1.

use clap::Parser;
use mame_updater::cli::Cli;
use mame_updater::config::UpdaterConfig;
use mame_updater::download::HttpClient;
use mame_updater::error::Result;
use mame_updater::pipeline::{UpdateReport, run_update};
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level());
    let mut stderr = std::io::stderr();
    let run_result = run(&cli);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn init_logging(level: log::LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<UpdateReport> {
    let (config_path, required) = cli.config_path();
    let config = UpdaterConfig::load(&config_path, required)?.apply_overrides(&cli.overrides());
    config.validate(&config_path)?;
    log::debug!("working directory is {}", cli.dir);

    let client = HttpClient::new(&config.releases_url, config.timeout());
    run_update(&config, &cli.dir, &client, &client)
}

fn exit_code_for_run_result(result: Result<UpdateReport>, stderr: &mut dyn Write) -> i32 {
    result.map_or_else(
        |err| {
            write_stderr_line(stderr, err);
            1
        },
        |report| {
            log::info!(
                "{} is staged at {} and {}",
                report.release_name,
                report.staged_binary,
                report.staged_document
            );
            log::info!("Fin.");
            0
        },
    )
}

fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Nowhere left to report to.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use mame_updater::classify::AssetRole;
    use mame_updater::error::UpdateError;

    #[test]
    fn exit_code_for_run_result_returns_zero_on_success() {
        let report = UpdateReport {
            release_name: "MAME 0.219".to_owned(),
            tag: "mame0219".to_owned(),
            published_at: None,
            staged_binary: Utf8PathBuf::from("mame.exe"),
            staged_document: Utf8PathBuf::from("mame.xml"),
        };
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Ok(report), &mut stderr);
        assert_eq!(exit_code, 0);
        assert!(stderr.is_empty());
    }

    #[test]
    fn exit_code_for_run_result_prints_error_and_returns_one() {
        let err = UpdateError::MissingRequiredAsset {
            release: "MAME 0.219".to_owned(),
            missing: vec![AssetRole::ChecksumManifest],
        };

        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Err(err), &mut stderr);
        assert_eq!(exit_code, 1);

        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert_eq!(stderr_text.lines().count(), 1);
        assert!(stderr_text.contains("checksum manifest"));
    }

    #[test]
    fn explicit_missing_config_fails_before_any_request() {
        let temp = tempfile::tempdir().expect("temp dir");
        let dir = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 path");
        let missing = dir.join("absent.toml");
        let cli = Cli::parse_from(["mame-updater", "-C", dir.as_str(), "-c", missing.as_str()]);

        let err = run(&cli).expect_err("missing config");
        assert!(matches!(err, UpdateError::Config { .. }));
    }

    #[test]
    fn empty_url_override_is_rejected() {
        let temp = tempfile::tempdir().expect("temp dir");
        let dir = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 path");
        let cli = Cli::parse_from(["mame-updater", "-C", dir.as_str(), "--releases-url", " "]);

        let err = run(&cli).expect_err("empty url");
        assert!(matches!(err, UpdateError::Config { .. }));
    }
}
