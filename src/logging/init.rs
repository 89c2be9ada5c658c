//! Logging setup
//!
//! Wires the console and rotating file sinks into a tracing subscriber. The
//! subscriber is installed once per process; [`init_logging`] hands back a
//! [`LoggingGuard`] that owns the file sink for the lifetime of the program.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tracing::Subscriber;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use super::file_writer::{RotatingFile, RotatingFileMaker};
use super::format::LineFormatter;
use super::rotation::RotationPolicy;
use crate::config::LoggingConfig;

static CONFIGURED: AtomicBool = AtomicBool::new(false);

/// Information about the active log file
#[derive(Debug, Clone)]
pub struct LogFileInfo {
    /// Full path to the log file
    pub path: PathBuf,
    /// Rotation policy computed at setup
    pub policy: RotationPolicy,
}

/// Guard that keeps the logging system alive
#[derive(Debug)]
pub struct LoggingGuard {
    info: LogFileInfo,
    file: Arc<Mutex<RotatingFile>>,
}

impl LoggingGuard {
    pub fn info(&self) -> &LogFileInfo {
        &self.info
    }

    /// Force a rotation of the log file
    pub fn rotate(&self) -> Result<()> {
        let mut file = self
            .file
            .lock()
            .map_err(|_| anyhow::anyhow!("Log file lock poisoned"))?;
        file.rotate().context("Failed to rotate log file")
    }
}

impl Drop for LoggingGuard {
    fn drop(&mut self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = std::io::Write::flush(&mut *file);
        }
    }
}

/// Create the log file and its parent directories if they are missing.
///
/// Existing files are left untouched.
pub fn prepare_log_file(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create log directory {}", parent.display())
            })?;
        }
    }

    if !path.exists() {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to create log file {}", path.display()))?;
    }

    Ok(())
}

fn parse_level(level: &str) -> Result<LevelFilter> {
    LevelFilter::from_str(level).with_context(|| format!("Invalid log level '{}'", level))
}

/// Build the logging subscriber without installing it.
///
/// `console` receives the colored output; [`init_logging`] passes stderr.
pub fn build_subscriber<W>(
    config: &LoggingConfig,
    console: W,
) -> Result<(impl Subscriber + Send + Sync + 'static, LoggingGuard)>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let level = parse_level(&config.level)?;
    let path = config.resolved_log_file()?;

    prepare_log_file(&path)?;

    let volume_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let policy = RotationPolicy::for_volume(volume_dir, config.max_backups).with_context(|| {
        format!("Failed to read volume statistics for {}", volume_dir.display())
    })?;

    let file = RotatingFile::open(&path, policy)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;
    let writer = RotatingFileMaker::new(file);

    let file_layer = tracing_subscriber::fmt::layer()
        .event_format(LineFormatter::plain())
        .with_writer(writer.clone())
        .with_ansi(false);

    let console_layer = tracing_subscriber::fmt::layer()
        .event_format(LineFormatter::console(config.console_colors))
        .with_writer(console);

    let subscriber = tracing_subscriber::registry()
        .with(level)
        .with(file_layer)
        .with(console_layer);

    let guard = LoggingGuard {
        info: LogFileInfo { path, policy },
        file: writer.shared(),
    };

    Ok((subscriber, guard))
}

/// Initialize console and rotating file logging.
///
/// A second call fails before touching the filesystem. Keep the returned
/// guard alive for the duration of logging.
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard> {
    if CONFIGURED.swap(true, Ordering::SeqCst) {
        anyhow::bail!("Logging is already configured");
    }

    let installed = build_subscriber(config, std::io::stderr).and_then(|(subscriber, guard)| {
        subscriber
            .try_init()
            .context("Failed to install logging subscriber")?;
        Ok(guard)
    });
    let guard = match installed {
        Ok(guard) => guard,
        Err(e) => {
            CONFIGURED.store(false, Ordering::SeqCst);
            return Err(e);
        }
    };

    tracing::info!(
        path = %guard.info().path.display(),
        max_bytes = guard.info().policy.max_bytes,
        "Logging setup complete."
    );

    Ok(guard)
}
