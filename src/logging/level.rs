//! Severity levels and their console colors

/// ANSI sequence that restores the default terminal color
pub const RESET: &str = "\x1b[0m";

/// Severity of a log record, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

/// Severity to ANSI color prefix
const COLORS: [(Severity, &str); 5] = [
    (Severity::Debug, "\x1b[94m"),
    (Severity::Info, "\x1b[92m"),
    (Severity::Warning, "\x1b[93m"),
    (Severity::Error, "\x1b[91m"),
    (Severity::Critical, "\x1b[91m\x1b[1m"),
];

impl Severity {
    /// All supported severities, least severe first
    pub const ALL: [Severity; 5] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warning,
        Severity::Error,
        Severity::Critical,
    ];

    /// Get the label rendered into log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }

    /// Parse a rendered label back into a severity
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == label)
    }

    /// ANSI color prefix for this severity
    pub fn color(&self) -> &'static str {
        COLORS
            .iter()
            .find(|(severity, _)| severity == self)
            .map(|(_, code)| *code)
            .unwrap_or("")
    }

    /// Map a tracing level to a severity.
    ///
    /// `critical` promotes ERROR events to CRITICAL. TRACE has no counterpart.
    pub fn from_tracing(level: &tracing::Level, critical: bool) -> Option<Self> {
        match *level {
            tracing::Level::ERROR if critical => Some(Severity::Critical),
            tracing::Level::ERROR => Some(Severity::Error),
            tracing::Level::WARN => Some(Severity::Warning),
            tracing::Level::INFO => Some(Severity::Info),
            tracing::Level::DEBUG => Some(Severity::Debug),
            tracing::Level::TRACE => None,
        }
    }
}

/// Label for a tracing event, falling back to the tracing name for levels
/// outside the supported set
pub fn level_label(level: &tracing::Level, critical: bool) -> &'static str {
    match Severity::from_tracing(level, critical) {
        Some(severity) => severity.as_str(),
        None => level.as_str(),
    }
}

/// Wrap a rendered line in the color for `label`.
///
/// Unknown labels are returned unchanged.
pub fn colorize(label: &str, line: &str) -> String {
    match Severity::from_label(label) {
        Some(severity) => format!("{}{}{}", severity.color(), line, RESET),
        None => line.to_string(),
    }
}
