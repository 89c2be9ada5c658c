//! Line formatting for the console and file sinks
//!
//! Both sinks render `timestamp - name - LEVEL - message`. The console variant
//! wraps the whole line in the severity's color.

use std::fmt::{self, Write as _};

use chrono::{DateTime, Local};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use super::level::{colorize, level_label};

/// Timestamp layout used in rendered lines
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Event field that promotes an ERROR event to CRITICAL
pub const CRITICAL_FIELD: &str = "critical";

/// A log record ready to be rendered
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// When the record was produced
    pub timestamp: DateTime<Local>,
    /// Logger name (the event target)
    pub name: String,
    /// Rendered level label, e.g. `WARNING`
    pub level: String,
    /// Message, followed by any extra fields as ` key=value`
    pub message: String,
}

impl LogRecord {
    /// Create a record stamped with the current time
    pub fn new(
        name: impl Into<String>,
        level: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Local::now(),
            name: name.into(),
            level: level.into(),
            message: message.into(),
        }
    }

    /// Extract a record from a tracing event
    pub fn from_event(event: &Event<'_>) -> Self {
        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);

        let metadata = event.metadata();
        let level = level_label(metadata.level(), visitor.critical);

        // Only ERROR events can be promoted; elsewhere the flag is plain data
        if *metadata.level() != tracing::Level::ERROR && visitor.critical {
            visitor.fields.push_str(" critical=true");
        }

        Self::new(metadata.target(), level, visitor.into_message())
    }

    /// Render as `timestamp - name - LEVEL - message`
    pub fn render(&self) -> String {
        format!(
            "{} - {} - {} - {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.name,
            self.level,
            self.message
        )
    }

    /// Render with the level's color prefix and a reset suffix
    pub fn render_colored(&self) -> String {
        colorize(&self.level, &self.render())
    }
}

/// Collects the message and extra fields of an event
#[derive(Default)]
struct RecordVisitor {
    message: String,
    fields: String,
    critical: bool,
}

impl RecordVisitor {
    fn into_message(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields.trim_start().to_string()
        } else {
            self.message + &self.fields
        }
    }
}

impl Visit for RecordVisitor {
    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == CRITICAL_FIELD {
            self.critical = value;
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

/// Event formatter shared by both sinks
#[derive(Debug, Clone, Copy)]
pub struct LineFormatter {
    colored: bool,
}

impl LineFormatter {
    /// Formatter for the file sink
    pub fn plain() -> Self {
        Self { colored: false }
    }

    /// Formatter for the console sink
    pub fn colored() -> Self {
        Self { colored: true }
    }

    /// Console formatter, colored only when `enabled`
    pub fn console(enabled: bool) -> Self {
        Self { colored: enabled }
    }
}

impl<S, N> FormatEvent<S, N> for LineFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let record = LogRecord::from_event(event);
        let line = if self.colored {
            record.render_colored()
        } else {
            record.render()
        };
        writeln!(writer, "{}", line)
    }
}
