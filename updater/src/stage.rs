//! Staging of verified outputs under fixed names.
//!
//! Downstream consumers always find the executable and the metadata document
//! at the same paths, whatever version-numbered names the release used. Files
//! are copied, never renamed, so the upstream-named download stays in place
//! and keeps satisfying the fetcher's size check on the next run.

use crate::error::{Result, UpdateError};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io::{BufReader, BufWriter};

/// Mode for staged files carrying the executable extension.
pub const EXECUTABLE_MODE: u32 = 0o775;

/// Mode for every other staged file.
pub const REGULAR_MODE: u32 = 0o664;

/// Copies files within the working directory to their canonical names.
#[derive(Debug, Clone)]
pub struct Stager {
    dir: Utf8PathBuf,
    executable_extension: String,
}

impl Stager {
    /// Create a stager for `dir`, treating `executable_extension` (without
    /// the dot) as the marker for executable permissions.
    #[must_use]
    pub fn new(dir: &Utf8Path, executable_extension: &str) -> Self {
        Self {
            dir: dir.to_owned(),
            executable_extension: executable_extension.to_owned(),
        }
    }

    /// Copy `source_name` to `dest_name`, both relative to the working
    /// directory, and return the destination path.
    ///
    /// An existing destination is overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::StageError`] if the source cannot be read or the
    /// destination cannot be written.
    pub fn stage(&self, source_name: &str, dest_name: &str) -> Result<Utf8PathBuf> {
        let source_path = self.dir.join(source_name);
        let dest_path = self.dir.join(dest_name);
        let stage_error = |source: std::io::Error| UpdateError::StageError {
            source_path: source_path.clone(),
            destination: dest_path.clone(),
            source,
        };

        let mode = staged_mode(source_name, &self.executable_extension);
        if source_path == dest_path {
            // Copying a file onto itself would truncate it first.
            set_mode(&dest_path, mode).map_err(stage_error)?;
            log::info!("{dest_name} is already in place");
            return Ok(dest_path);
        }

        let mut reader = BufReader::new(fs::File::open(&source_path).map_err(stage_error)?);
        let mut writer = BufWriter::new(fs::File::create(&dest_path).map_err(stage_error)?);
        let copied = std::io::copy(&mut reader, &mut writer).map_err(stage_error)?;
        let out = writer.into_inner().map_err(|e| stage_error(e.into_error()))?;
        out.sync_all().map_err(stage_error)?;
        drop(out);
        set_mode(&dest_path, mode).map_err(stage_error)?;

        log::info!("Staged {source_name} as {dest_name} ({copied} bytes, mode {mode:o})");
        Ok(dest_path)
    }
}

/// Permission bits a staged copy of `filename` receives.
///
/// # Examples
///
/// ```
/// use mame_updater::stage::staged_mode;
///
/// assert_eq!(staged_mode("mame0219b_64bit.exe", "exe"), 0o775);
/// assert_eq!(staged_mode("mame0219.xml", "exe"), 0o664);
/// ```
#[must_use]
pub fn staged_mode(filename: &str, executable_extension: &str) -> u32 {
    if Utf8Path::new(filename).extension() == Some(executable_extension) {
        EXECUTABLE_MODE
    } else {
        REGULAR_MODE
    }
}

#[cfg(unix)]
fn set_mode(path: &Utf8Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
const fn set_mode(_path: &Utf8Path, _mode: u32) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn temp_dir() -> (tempfile::TempDir, Utf8PathBuf) {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 path");
        (temp, path)
    }

    #[rstest]
    #[case::executable("mame0219b_64bit.exe", EXECUTABLE_MODE)]
    #[case::document("mame0219.xml", REGULAR_MODE)]
    #[case::no_extension("exe", REGULAR_MODE)]
    #[case::case_sensitive("MAME.EXE", REGULAR_MODE)]
    fn mode_follows_source_extension(#[case] filename: &str, #[case] expected: u32) {
        assert_eq!(staged_mode(filename, "exe"), expected);
    }

    #[rstest]
    #[case::executable("mame0219b_64bit.exe", "mame.exe", b"MZ\x90\x00binary".as_slice())]
    #[case::document("mame0219.xml", "mame.xml", b"<mame build=\"0.219\"/>".as_slice())]
    fn staged_copy_is_byte_identical(
        #[case] source: &str,
        #[case] dest: &str,
        #[case] content: &[u8],
    ) {
        let (_temp, dir) = temp_dir();
        fs::write(dir.join(source), content).expect("write source");
        let stager = Stager::new(&dir, "exe");

        let staged = stager.stage(source, dest).expect("stage");
        assert_eq!(staged, dir.join(dest));
        assert_eq!(fs::read(&staged).expect("read back"), content);
        assert!(dir.join(source).exists(), "source must survive staging");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&staged).expect("metadata").permissions().mode() & 0o777;
            assert_eq!(mode, staged_mode(source, "exe"));
        }
    }

    #[test]
    fn restaging_replaces_longer_previous_copy() {
        let (_temp, dir) = temp_dir();
        fs::write(dir.join("mame.xml"), b"a much longer previous document").expect("seed");
        fs::write(dir.join("mame0219.xml"), b"<new/>").expect("write source");

        let staged = Stager::new(&dir, "exe")
            .stage("mame0219.xml", "mame.xml")
            .expect("stage");
        assert_eq!(fs::read(staged).expect("read back"), b"<new/>");
    }

    #[test]
    fn staging_onto_itself_keeps_content() {
        let (_temp, dir) = temp_dir();
        fs::write(dir.join("mame.xml"), b"<mame/>").expect("seed");

        let staged = Stager::new(&dir, "exe")
            .stage("mame.xml", "mame.xml")
            .expect("stage");
        assert_eq!(fs::read(staged).expect("read back"), b"<mame/>");
    }

    #[test]
    fn missing_source_is_a_stage_error() {
        let (_temp, dir) = temp_dir();
        let err = Stager::new(&dir, "exe")
            .stage("absent.exe", "mame.exe")
            .expect_err("missing source");
        assert!(matches!(err, UpdateError::StageError { .. }));
        assert!(!dir.join("mame.exe").exists());
    }
}
