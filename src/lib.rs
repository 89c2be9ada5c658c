//! applog - application logging setup
//!
//! Colored console output, size-rotated log files and age-based cleanup of
//! old logs, built on `tracing`.

pub mod config;
pub mod logging;
