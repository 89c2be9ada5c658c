//! Logging system for applog
//!
//! Provides colored console logging, size-rotated file logging, and cleanup of
//! old log files.

pub mod file_writer;
mod format;
mod init;
mod level;
mod retention;
pub mod rotation;

pub use format::{LineFormatter, LogRecord, CRITICAL_FIELD, TIMESTAMP_FORMAT};
pub use init::{build_subscriber, init_logging, prepare_log_file, LogFileInfo, LoggingGuard};
pub use level::{colorize, Severity, RESET};
pub use retention::{
    cleanup_old_logs, cleanup_old_logs_with_retention, cleanup_temp_log_dir, retention_cutoff,
    CleanupError, CleanupOutcome, DEFAULT_RETENTION_DAYS,
};

/// Log at CRITICAL severity.
///
/// Emits an ERROR event carrying `critical = true`, which the formatters
/// render as `CRITICAL`. On other levels the field is rendered as plain data.
#[macro_export]
macro_rules! critical {
    (target: $target:expr, $($arg:tt)+) => {
        ::tracing::error!(target: $target, critical = true, $($arg)+)
    };
    ($($arg:tt)+) => {
        ::tracing::error!(critical = true, $($arg)+)
    };
}
