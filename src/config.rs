//! Configuration management for applog

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::logging::rotation::DEFAULT_MAX_BACKUPS;
use crate::logging::DEFAULT_RETENTION_DAYS;

/// Environment variable overriding the log file location
pub const LOG_FILE_ENV: &str = "APP_LOG_FILE_PATH";

/// Log file location used when nothing else is configured
pub const DEFAULT_LOG_FILE: &str = "logs/app.log";

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log file path, relative paths resolve against the working directory
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    /// Minimum level written by both sinks (default: "debug")
    #[serde(default = "default_level")]
    pub level: String,

    /// Rotated backups kept next to the log file (default: 10)
    #[serde(default = "default_max_backups")]
    pub max_backups: usize,

    /// Age in days after which old log files are deleted (default: 7)
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Color console output by level (default: true)
    #[serde(default = "default_console_colors")]
    pub console_colors: bool,
}

fn default_log_file() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_FILE)
}

fn default_level() -> String {
    "debug".to_string()
}

fn default_max_backups() -> usize {
    DEFAULT_MAX_BACKUPS
}

fn default_retention_days() -> u32 {
    DEFAULT_RETENTION_DAYS
}

fn default_console_colors() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
            level: default_level(),
            max_backups: default_max_backups(),
            retention_days: default_retention_days(),
            console_colors: default_console_colors(),
        }
    }
}

impl LoggingConfig {
    /// Defaults, with the log file taken from `APP_LOG_FILE_PATH` if set
    pub fn from_env() -> Self {
        Self::default().with_env_override(std::env::var_os(LOG_FILE_ENV).map(PathBuf::from))
    }

    /// Load configuration from a TOML file, or defaults if it does not exist.
    ///
    /// `APP_LOG_FILE_PATH` still takes precedence over the file.
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            Self::parse(&content)?
        } else {
            Self::default()
        };
        Ok(config.with_env_override(std::env::var_os(LOG_FILE_ENV).map(PathBuf::from)))
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Replace the log file with `value` unless it is empty or absent
    pub fn with_env_override(mut self, value: Option<PathBuf>) -> Self {
        if let Some(path) = value.filter(|p| !p.as_os_str().is_empty()) {
            self.log_file = path;
        }
        self
    }

    /// Absolute path of the log file
    pub fn resolved_log_file(&self) -> Result<PathBuf> {
        if self.log_file.is_absolute() {
            return Ok(self.log_file.clone());
        }
        let cwd = std::env::current_dir().context("Failed to determine working directory")?;
        Ok(cwd.join(&self.log_file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.log_file, PathBuf::from("logs/app.log"));
        assert_eq!(config.level, "debug");
        assert_eq!(config.max_backups, 10);
        assert_eq!(config.retention_days, 7);
        assert!(config.console_colors);
    }

    #[test]
    fn test_config_serialization() {
        let config = LoggingConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed = LoggingConfig::parse(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_parse_partial_config() {
        let config = LoggingConfig::parse("level = \"info\"\nretention_days = 30\n").unwrap();
        assert_eq!(config.level, "info");
        assert_eq!(config.retention_days, 30);
        assert_eq!(config.max_backups, 10);
        assert_eq!(config.log_file, PathBuf::from("logs/app.log"));
    }

    #[test]
    fn test_parse_invalid_config() {
        assert!(LoggingConfig::parse("max_backups = \"many\"").is_err());
    }

    #[test]
    fn test_env_override() {
        let config =
            LoggingConfig::default().with_env_override(Some(PathBuf::from("/var/log/svc.log")));
        assert_eq!(config.log_file, PathBuf::from("/var/log/svc.log"));
    }

    #[test]
    fn test_env_override_empty_ignored() {
        let config = LoggingConfig::default().with_env_override(Some(PathBuf::new()));
        assert_eq!(config.log_file, PathBuf::from("logs/app.log"));
        let config = LoggingConfig::default().with_env_override(None);
        assert_eq!(config.log_file, PathBuf::from("logs/app.log"));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = LoggingConfig::load(&temp_dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.level, "debug");
        assert_eq!(config.max_backups, 10);
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("logging.toml");
        std::fs::write(&path, "max_backups = 3\nconsole_colors = false\n").unwrap();
        let config = LoggingConfig::load(&path).unwrap();
        assert_eq!(config.max_backups, 3);
        assert!(!config.console_colors);
    }

    #[test]
    fn test_resolved_log_file_is_absolute() {
        let config = LoggingConfig::default();
        let resolved = config.resolved_log_file().unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("logs/app.log"));
    }
}
