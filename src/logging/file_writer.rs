//! Size-rotated log file
//!
//! Writes go to `<file>`; once the next write would reach the rotation size,
//! the file is renamed to `<file>.1`, existing backups shift up by one and the
//! highest one beyond `max_backups` is dropped.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;

use super::rotation::RotationPolicy;

/// Path of the `index`-th backup of `path`, e.g. `app.log.3`
pub fn backup_path(path: &Path, index: usize) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(".{}", index));
    PathBuf::from(name)
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// A log file that rotates by size
#[derive(Debug)]
pub struct RotatingFile {
    path: PathBuf,
    policy: RotationPolicy,
    file: File,
    written: u64,
    // Set while `file` still points at a renamed backup
    stale: bool,
}

impl RotatingFile {
    /// Open `path` for appending, creating it if absent.
    ///
    /// Existing content is kept and counts toward the rotation size.
    pub fn open(path: impl Into<PathBuf>, policy: RotationPolicy) -> io::Result<Self> {
        let path = path.into();
        let file = open_append(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            path,
            policy,
            file,
            written,
            stale: false,
        })
    }

    /// Bytes in the active file
    pub fn written(&self) -> u64 {
        self.written
    }

    fn should_rotate(&self, incoming: usize) -> bool {
        self.policy.max_bytes > 0
            && self.written > 0
            && self.written.saturating_add(incoming as u64) >= self.policy.max_bytes
    }

    /// Rotate now, regardless of size
    pub fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.policy.max_backups == 0 {
            self.file = OpenOptions::new()
                .write(true)
                .truncate(true)
                .open(&self.path)?;
            self.written = 0;
            return Ok(());
        }

        for index in (1..self.policy.max_backups).rev() {
            let src = backup_path(&self.path, index);
            if src.exists() {
                let dst = backup_path(&self.path, index + 1);
                if dst.exists() {
                    fs::remove_file(&dst)?;
                }
                fs::rename(&src, &dst)?;
            }
        }

        let first = backup_path(&self.path, 1);
        if first.exists() {
            fs::remove_file(&first)?;
        }
        fs::rename(&self.path, &first)?;

        self.stale = true;
        self.reopen()
    }

    /// Open a fresh active file after a rotation.
    ///
    /// On failure the file stays stale and writes are refused until a later
    /// write manages to reopen it.
    fn reopen(&mut self) -> io::Result<()> {
        self.file = open_append(&self.path)?;
        self.written = 0;
        self.stale = false;
        Ok(())
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.stale {
            self.reopen()?;
        }
        if self.should_rotate(buf.len()) {
            self.rotate()?;
        }
        self.file.write_all(buf)?;
        self.written = self.written.saturating_add(buf.len() as u64);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Writer handed out per event by [`RotatingFileMaker`]
pub struct RotatingFileWriter {
    file: Arc<Mutex<RotatingFile>>,
}

impl Write for RotatingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.file.lock() {
            Ok(mut file) => file.write(buf),
            Err(_) => Err(io::Error::new(io::ErrorKind::Other, "log file lock poisoned")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Ok(mut file) = self.file.lock() {
            file.flush()
        } else {
            Ok(())
        }
    }
}

/// Writer factory for tracing-subscriber
#[derive(Clone)]
pub struct RotatingFileMaker {
    file: Arc<Mutex<RotatingFile>>,
}

impl RotatingFileMaker {
    /// Share `file` between the subscriber and the caller's handle
    pub fn new(file: RotatingFile) -> Self {
        Self {
            file: Arc::new(Mutex::new(file)),
        }
    }

    /// Shared handle to the underlying file
    pub fn shared(&self) -> Arc<Mutex<RotatingFile>> {
        Arc::clone(&self.file)
    }
}

impl<'a> MakeWriter<'a> for RotatingFileMaker {
    type Writer = RotatingFileWriter;

    fn make_writer(&'a self) -> Self::Writer {
        RotatingFileWriter {
            file: Arc::clone(&self.file),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn policy(max_bytes: u64, max_backups: usize) -> RotationPolicy {
        RotationPolicy {
            max_bytes,
            max_backups,
        }
    }

    #[test]
    fn test_backup_path() {
        let path = PathBuf::from("/tmp/logs/app.log");
        assert_eq!(backup_path(&path, 1), PathBuf::from("/tmp/logs/app.log.1"));
        assert_eq!(backup_path(&path, 10), PathBuf::from("/tmp/logs/app.log.10"));
    }

    #[test]
    fn test_open_keeps_existing_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        fs::write(&path, b"earlier line\n").unwrap();

        let mut file = RotatingFile::open(&path, policy(1024, 2)).unwrap();
        assert_eq!(file.written(), 13);
        file.write_all(b"later line\n").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "earlier line\nlater line\n");
    }

    #[test]
    fn test_rotates_at_size() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        let mut file = RotatingFile::open(&path, policy(10, 3)).unwrap();

        file.write_all(b"aaaaaa\n").unwrap();
        // 7 + 7 >= 10
        file.write_all(b"bbbbbb\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "bbbbbb\n");
        assert_eq!(
            fs::read_to_string(backup_path(&path, 1)).unwrap(),
            "aaaaaa\n"
        );
        assert!(!backup_path(&path, 2).exists());
    }

    #[test]
    fn test_oldest_backup_evicted() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        let mut file = RotatingFile::open(&path, policy(4, 2)).unwrap();

        for line in ["one\n", "two\n", "three\n", "four\n"] {
            file.write_all(line.as_bytes()).unwrap();
        }

        assert_eq!(fs::read_to_string(&path).unwrap(), "four\n");
        assert_eq!(fs::read_to_string(backup_path(&path, 1)).unwrap(), "three\n");
        assert_eq!(fs::read_to_string(backup_path(&path, 2)).unwrap(), "two\n");
        assert!(!backup_path(&path, 3).exists());
    }

    #[test]
    fn test_empty_file_not_rotated() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        let mut file = RotatingFile::open(&path, policy(4, 2)).unwrap();

        file.write_all(b"longer than the limit\n").unwrap();

        assert!(!backup_path(&path, 1).exists());
        assert_eq!(file.written(), 22);
    }

    #[test]
    fn test_failed_reopen_keeps_backup_intact() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        let mut file = RotatingFile::open(&path, policy(1024, 2)).unwrap();
        file.write_all(b"first\n").unwrap();

        // A rotation whose reopen fails: the active path is blocked by a directory
        fs::rename(&path, backup_path(&path, 1)).unwrap();
        fs::create_dir(&path).unwrap();
        file.stale = true;
        assert!(file.reopen().is_err());
        assert!(file.stale);
        assert_eq!(file.written(), 6);

        assert!(file.write_all(b"dropped\n").is_err());
        assert_eq!(fs::read_to_string(backup_path(&path, 1)).unwrap(), "first\n");

        fs::remove_dir(&path).unwrap();
        file.write_all(b"second\n").unwrap();
        assert!(!file.stale);
        assert_eq!(file.written(), 7);
        assert_eq!(fs::read_to_string(&path).unwrap(), "second\n");
        assert_eq!(fs::read_to_string(backup_path(&path, 1)).unwrap(), "first\n");
    }

    #[test]
    fn test_zero_backups_truncates() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        let mut file = RotatingFile::open(&path, policy(8, 0)).unwrap();

        file.write_all(b"first\n").unwrap();
        file.write_all(b"second\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second\n");
        assert!(!backup_path(&path, 1).exists());
    }

    #[test]
    fn test_maker_shares_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        let maker = RotatingFileMaker::new(RotatingFile::open(&path, policy(1024, 2)).unwrap());

        maker.make_writer().write_all(b"via writer\n").unwrap();

        let shared = maker.shared();
        assert_eq!(shared.lock().unwrap().written(), 11);
        assert_eq!(fs::read_to_string(&path).unwrap(), "via writer\n");
    }
}
