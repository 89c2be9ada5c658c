//! Log file retention management
//!
//! Handles cleanup of old log files based on age. Failures are logged and
//! reported in the returned [`CleanupOutcome`], never propagated.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

/// Default retention period in days
pub const DEFAULT_RETENTION_DAYS: u32 = 7;

/// Extension of files considered by the sweep
pub const LOG_EXTENSION: &str = ".log";

/// A single failure during cleanup
#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("failed to read log directory {}: {source}", .directory.display())]
    ReadDir {
        directory: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to inspect log file {}: {source}", .file.display())]
    Inspect {
        file: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to delete old log file {}: {source}", .file.display())]
    Delete {
        file: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to remove temporary log directory {}: {source}", .directory.display())]
    RemoveDir {
        directory: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CleanupError {
    /// The file or directory the failure refers to
    pub fn path(&self) -> &Path {
        match self {
            CleanupError::ReadDir { directory, .. } | CleanupError::RemoveDir { directory, .. } => {
                directory
            }
            CleanupError::Inspect { file, .. } | CleanupError::Delete { file, .. } => file,
        }
    }

    /// Underlying IO error
    pub fn io_error(&self) -> &io::Error {
        match self {
            CleanupError::ReadDir { source, .. }
            | CleanupError::Inspect { source, .. }
            | CleanupError::Delete { source, .. }
            | CleanupError::RemoveDir { source, .. } => source,
        }
    }
}

/// Result of a cleanup pass
#[derive(Debug)]
pub enum CleanupOutcome {
    /// Everything eligible was removed
    Success { deleted: Vec<PathBuf> },
    /// The pass stopped early; `deleted` holds what was removed before that
    PartialFailure {
        deleted: Vec<PathBuf>,
        errors: Vec<CleanupError>,
    },
}

impl CleanupOutcome {
    fn finish(deleted: Vec<PathBuf>, errors: Vec<CleanupError>) -> Self {
        if errors.is_empty() {
            CleanupOutcome::Success { deleted }
        } else {
            CleanupOutcome::PartialFailure { deleted, errors }
        }
    }

    /// Paths removed by this pass
    pub fn deleted(&self) -> &[PathBuf] {
        match self {
            CleanupOutcome::Success { deleted } | CleanupOutcome::PartialFailure { deleted, .. } => {
                deleted
            }
        }
    }

    /// Failures that occurred, empty on success
    pub fn errors(&self) -> &[CleanupError] {
        match self {
            CleanupOutcome::Success { .. } => &[],
            CleanupOutcome::PartialFailure { errors, .. } => errors,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CleanupOutcome::Success { .. })
    }
}

/// Instant before which log files count as expired
pub fn retention_cutoff(now: DateTime<Utc>, retention_days: u32) -> DateTime<Utc> {
    now.checked_sub_signed(Duration::days(i64::from(retention_days)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(unix)]
fn is_log_file(path: &Path) -> bool {
    use std::os::unix::ffi::OsStrExt;

    // Raw bytes, so names that are not valid UTF-8 still match
    path.file_name()
        .map(|name| name.as_bytes().ends_with(LOG_EXTENSION.as_bytes()))
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_log_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().ends_with(LOG_EXTENSION))
        .unwrap_or(false)
}

/// Clean up log files older than the default retention period
pub fn cleanup_old_logs(logs_dir: &Path) -> CleanupOutcome {
    cleanup_old_logs_with_retention(logs_dir, DEFAULT_RETENTION_DAYS)
}

/// Clean up `*.log` files in `logs_dir` last modified more than
/// `retention_days` days ago.
///
/// The first error ends the pass; it is logged and returned in the outcome.
pub fn cleanup_old_logs_with_retention(logs_dir: &Path, retention_days: u32) -> CleanupOutcome {
    let cutoff = retention_cutoff(Utc::now(), retention_days);
    let mut deleted = Vec::new();

    let errors = match sweep(logs_dir, cutoff, &mut deleted) {
        Ok(()) => Vec::new(),
        Err(error) => {
            tracing::error!(
                directory = %logs_dir.display(),
                file = %error.path().display(),
                error = %error.io_error(),
                "Failed to clean up old log files"
            );
            vec![error]
        }
    };

    if !deleted.is_empty() {
        tracing::debug!(
            directory = %logs_dir.display(),
            count = deleted.len(),
            "Old log cleanup finished"
        );
    }

    CleanupOutcome::finish(deleted, errors)
}

fn sweep(
    logs_dir: &Path,
    cutoff: DateTime<Utc>,
    deleted: &mut Vec<PathBuf>,
) -> Result<(), CleanupError> {
    let read_dir_error = |source| CleanupError::ReadDir {
        directory: logs_dir.to_path_buf(),
        source,
    };

    let entries = match fs::read_dir(logs_dir) {
        Ok(entries) => entries,
        // Nothing to enumerate
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(read_dir_error(e)),
    };

    for entry in entries {
        let path = entry.map_err(read_dir_error)?.path();
        if !is_log_file(&path) {
            continue;
        }

        let modified = fs::metadata(&path)
            .and_then(|m| m.modified())
            .map_err(|source| CleanupError::Inspect {
                file: path.clone(),
                source,
            })?;

        if DateTime::<Utc>::from(modified) < cutoff {
            fs::remove_file(&path).map_err(|source| CleanupError::Delete {
                file: path.clone(),
                source,
            })?;
            tracing::info!(file = %path.display(), "Deleted old log file");
            deleted.push(path);
        }
    }

    Ok(())
}

/// Remove a temporary log directory, which only succeeds if it is empty
pub fn cleanup_temp_log_dir(temp_dir: &Path) -> CleanupOutcome {
    match fs::remove_dir(temp_dir) {
        Ok(()) => {
            tracing::info!(directory = %temp_dir.display(), "Removed temporary log directory");
            CleanupOutcome::Success {
                deleted: vec![temp_dir.to_path_buf()],
            }
        }
        Err(source) => {
            tracing::error!(
                directory = %temp_dir.display(),
                error = %source,
                "Failed to remove temporary log directory"
            );
            CleanupOutcome::finish(
                Vec::new(),
                vec![CleanupError::RemoveDir {
                    directory: temp_dir.to_path_buf(),
                    source,
                }],
            )
        }
    }
}
