//! Shared types for logmatch
//!
//! This crate contains the parsed representation of a structured log
//! record, used by both the source adapter and the matcher.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Key/value payload attached to a log entry
pub type LogData = HashMap<String, serde_json::Value>;

// ============================================================================
// Log Level
// ============================================================================

/// Log severity level
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Error,
    Fatal,
}

impl LogLevel {
    pub const ALL: [LogLevel; 4] = [Self::Debug, Self::Info, Self::Error, Self::Fatal];

    /// Parse log level from common spellings
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "debug" | "dbg" | "debg" => Some(Self::Debug),
            "info" | "inf" | "information" => Some(Self::Info),
            "error" | "err" | "erro" => Some(Self::Error),
            "fatal" | "panic" | "critical" | "crit" | "ftl" => Some(Self::Fatal),
            _ => None,
        }
    }

    /// Map the numeric `log_level` written by lager-style loggers
    pub fn from_lager(n: u64) -> Option<Self> {
        match n {
            0 => Some(Self::Debug),
            1 => Some(Self::Info),
            2 => Some(Self::Error),
            3 => Some(Self::Fatal),
            _ => None,
        }
    }

    /// Numeric level as written on the wire
    pub fn as_lager(&self) -> u8 {
        match self {
            Self::Debug => 0,
            Self::Info => 1,
            Self::Error => 2,
            Self::Fatal => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }

    /// Whether entries at this level carry an error
    pub fn carries_error(&self) -> bool {
        matches!(self, Self::Error | Self::Fatal)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Log Entry
// ============================================================================

/// A single decoded log record
#[derive(Clone, Debug, PartialEq)]
pub struct LogEntry {
    /// 1-based position of the record in the decoded content
    pub line_number: u64,

    /// Parsed timestamp (informational, never used for ordering)
    pub timestamp: Option<DateTime<Utc>>,

    pub level: LogLevel,

    /// Tag of the emitting component
    pub source: String,

    /// Conventionally `<source>.<action>`
    pub message: String,

    pub data: LogData,

    /// Error text, only ever set for error and fatal entries
    pub error: Option<String>,

    /// Original raw log line
    pub raw: String,
}

impl LogEntry {
    /// Create a new log entry with minimal fields
    pub fn new(level: LogLevel, source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            line_number: 0,
            timestamp: None,
            level,
            source: source.into(),
            message: message.into(),
            data: LogData::new(),
            error: None,
            raw: String::new(),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Attach an error. Ignored for levels that never carry one.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        if self.level.carries_error() {
            self.error = Some(error.into());
        }
        self
    }

    /// The message with the `<source>.` prefix stripped
    pub fn action(&self) -> &str {
        self.message
            .strip_prefix(self.source.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(&self.message)
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}(source={:?}, message={:?}",
            self.level, self.source, self.message
        )?;
        if let Some(error) = &self.error {
            write!(f, ", error={:?}", error)?;
        }
        if !self.data.is_empty() {
            write!(f, ", data={}", render_data(&self.data))?;
        }
        f.write_str(")")
    }
}

/// Render a data map with sorted keys so output is stable
pub fn render_data(data: &LogData) -> String {
    let sorted: std::collections::BTreeMap<_, _> = data.iter().collect();
    serde_json::to_string(&sorted).unwrap_or_else(|_| format!("{:?}", sorted))
}
