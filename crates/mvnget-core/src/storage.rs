//! Download file lifecycle: stream into `<dest>.part`, fsync, rename.
//!
//! A destination path only ever appears on disk fully written. A crash
//! mid-transfer leaves at most a stale `.part` file, which the next attempt
//! truncates.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `foo.jar` → `foo.jar.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Sequential writer for one in-progress download.
pub struct PartFile {
    file: File,
    temp_path: PathBuf,
    final_path: PathBuf,
    written: u64,
}

impl PartFile {
    /// Create (or truncate) the temp file for `final_path`, creating parent
    /// directories as needed.
    pub fn create(final_path: &Path) -> io::Result<Self> {
        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp_path = temp_path(final_path);
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        Ok(Self {
            file,
            temp_path,
            final_path: final_path.to_path_buf(),
            written: 0,
        })
    }

    pub fn write_chunk(&mut self, data: &[u8]) -> io::Result<()> {
        self.file.write_all(data)?;
        self.written += data.len() as u64;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Sync to disk and atomically rename onto the final path. Returns bytes written.
    pub fn finalize(self) -> io::Result<u64> {
        self.file.sync_all()?;
        drop(self.file);
        fs::rename(&self.temp_path, &self.final_path)?;
        Ok(self.written)
    }

    /// Drop the temp file after a failed attempt.
    pub fn discard(self) {
        drop(self.file);
        if let Err(e) = fs::remove_file(&self.temp_path) {
            tracing::debug!(path = %self.temp_path.display(), error = %e, "could not remove temp file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_path_appends_part() {
        let p = temp_path(Path::new("foo-1.0.jar"));
        assert_eq!(p.to_string_lossy(), "foo-1.0.jar.part");
        let p2 = temp_path(Path::new("/tmp/org/foo/foo-1.0.pom"));
        assert_eq!(p2.to_string_lossy(), "/tmp/org/foo/foo-1.0.pom.part");
    }

    #[test]
    fn write_and_finalize() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("org/foo/1.0/foo-1.0.jar");

        let mut part = PartFile::create(&final_path).unwrap();
        part.write_chunk(b"hello ").unwrap();
        part.write_chunk(b"world").unwrap();
        assert_eq!(part.written(), 11);
        let tp = part.temp_path().to_path_buf();
        assert!(tp.exists());
        assert!(!final_path.exists());

        assert_eq!(part.finalize().unwrap(), 11);
        assert!(!tp.exists());
        assert_eq!(fs::read(&final_path).unwrap(), b"hello world");
    }

    #[test]
    fn discard_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("a.pom");
        let mut part = PartFile::create(&final_path).unwrap();
        part.write_chunk(b"<html>404</html>").unwrap();
        let tp = part.temp_path().to_path_buf();
        part.discard();
        assert!(!tp.exists());
        assert!(!final_path.exists());
    }

    #[test]
    fn create_truncates_stale_part() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("b.jar");
        fs::write(temp_path(&final_path), b"stale bytes from a crash").unwrap();
        let mut part = PartFile::create(&final_path).unwrap();
        part.write_chunk(b"ok").unwrap();
        part.finalize().unwrap();
        assert_eq!(fs::read(&final_path).unwrap(), b"ok");
    }
}
