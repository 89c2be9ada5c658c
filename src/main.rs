use std::path::Path;

use anyhow::Result;

use applog::config::LoggingConfig;
use applog::logging;

fn main() -> Result<()> {
    let config = LoggingConfig::from_env();

    // Initialize logging BEFORE any tracing calls
    let _guard = logging::init_logging(&config)?;

    tracing::debug!("This is a debug message.");
    tracing::info!("This is an info message.");
    tracing::warn!("This is a warning message.");
    tracing::error!("This is an error message.");
    applog::critical!("This is a critical message.");

    // Clean up old logs (7-day retention unless configured otherwise)
    let outcome =
        logging::cleanup_old_logs_with_retention(Path::new("logs"), config.retention_days);
    if !outcome.deleted().is_empty() {
        tracing::info!("Cleaned up {} old log files", outcome.deleted().len());
    }

    Ok(())
}
