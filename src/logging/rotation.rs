//! Size-based rotation policy
//!
//! The rotation size is derived once, at setup, from the capacity of the
//! volume holding the log file.

use std::io;
use std::path::Path;

/// Upper bound on the rotation size (4 GiB)
pub const MAX_ROTATION_BYTES: u64 = 4 * 1024 * 1024 * 1024;

/// Share of the volume a single log file may grow to, in percent
pub const VOLUME_SHARE_PERCENT: u64 = 15;

/// Default number of rotated backups kept next to the log file
pub const DEFAULT_MAX_BACKUPS: usize = 10;

/// When to rotate and how many backups to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Rotate before a write would bring the file to this size
    pub max_bytes: u64,
    /// Number of `<file>.N` backups kept
    pub max_backups: usize,
}

impl RotationPolicy {
    /// Policy for a volume with the given total capacity in bytes
    pub fn for_capacity(total_capacity: u64, max_backups: usize) -> Self {
        Self {
            max_bytes: rotation_size(total_capacity),
            max_backups,
        }
    }

    /// Policy for the volume holding `dir`
    pub fn for_volume(dir: &Path, max_backups: usize) -> io::Result<Self> {
        let max_bytes = match volume_capacity(dir)? {
            Some(capacity) => rotation_size(capacity),
            None => MAX_ROTATION_BYTES,
        };
        Ok(Self {
            max_bytes,
            max_backups,
        })
    }
}

/// min(15% of the volume, 4 GiB)
pub fn rotation_size(total_capacity: u64) -> u64 {
    let share = u128::from(total_capacity) * u128::from(VOLUME_SHARE_PERCENT) / 100;
    u64::try_from(share)
        .unwrap_or(u64::MAX)
        .min(MAX_ROTATION_BYTES)
}

/// Total capacity in bytes of the volume holding `path`.
///
/// Returns `None` on platforms without volume statistics.
#[cfg(unix)]
#[allow(clippy::unnecessary_cast)]
pub fn volume_capacity(path: &Path) -> io::Result<Option<u64>> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains a NUL byte"))?;

    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(Some((stat.f_blocks as u64).saturating_mul(stat.f_frsize as u64)))
}

#[cfg(not(unix))]
pub fn volume_capacity(_path: &Path) -> io::Result<Option<u64>> {
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const GIB: u64 = 1024 * 1024 * 1024;

    #[test]
    fn test_rotation_size_capped() {
        assert_eq!(rotation_size(100 * GIB), 4 * GIB);
    }

    #[test]
    fn test_rotation_size_under_cap() {
        assert_eq!(rotation_size(10 * GIB), 1_610_612_736);
        assert_eq!(rotation_size(10 * GIB), 3 * GIB / 2);
    }

    #[test]
    fn test_rotation_size_edges() {
        assert_eq!(rotation_size(0), 0);
        assert_eq!(rotation_size(u64::MAX), MAX_ROTATION_BYTES);
    }

    #[test]
    fn test_policy_for_capacity() {
        let policy = RotationPolicy::for_capacity(10 * GIB, DEFAULT_MAX_BACKUPS);
        assert_eq!(policy.max_backups, 10);
        assert_eq!(policy.max_bytes, 3 * GIB / 2);
    }

    #[test]
    fn test_policy_for_volume() {
        let temp_dir = TempDir::new().unwrap();
        let policy = RotationPolicy::for_volume(temp_dir.path(), 3).unwrap();
        assert_eq!(policy.max_backups, 3);
        assert!(policy.max_bytes <= MAX_ROTATION_BYTES);
    }

    #[cfg(unix)]
    #[test]
    fn test_volume_capacity_missing_path() {
        assert!(volume_capacity(Path::new("/nonexistent/path/for/testing")).is_err());
    }
}
