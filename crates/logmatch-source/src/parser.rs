use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::{Result, SourceError};
use logmatch_types::{LogData, LogEntry, LogLevel};

/// Decoder for line-delimited structured log records
pub struct LogParser;

impl LogParser {
    /// Parse a single raw line into a LogEntry
    ///
    /// Returns `None` when the line is not a JSON object carrying a level,
    /// a source and a message.
    pub fn parse(raw: &str, line_number: u64) -> Option<LogEntry> {
        let trimmed = raw.trim();
        if !trimmed.starts_with('{') {
            return None;
        }

        let value: Value = serde_json::from_str(trimmed).ok()?;
        let obj = value.as_object()?;

        let level = Self::extract_level(obj)?;
        let source = obj.get("source")?.as_str()?.to_string();
        let message = obj.get("message")?.as_str()?.to_string();

        let data: LogData = match obj.get("data") {
            None | Some(Value::Null) => LogData::new(),
            Some(Value::Object(map)) => map.clone().into_iter().collect(),
            Some(_) => return None,
        };

        let error = if level.carries_error() {
            data.get("error")
                .or_else(|| obj.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        } else {
            None
        };

        Some(LogEntry {
            line_number,
            timestamp: obj.get("timestamp").and_then(Self::parse_timestamp),
            level,
            source,
            message,
            data,
            error,
            raw: raw.to_string(),
        })
    }

    /// Decode every line of `bytes`, in order
    ///
    /// Undecodable lines are skipped. Content that has lines but no
    /// decodable record at all is rejected as malformed. An unterminated
    /// last line may still be in flight, so failing to decode it never
    /// counts as a rejection.
    pub fn decode(bytes: &[u8]) -> Result<Vec<LogEntry>> {
        let mut entries = Vec::new();
        let mut rejected = 0;

        // `split` always yields a final segment; it is empty when the
        // content is newline-terminated
        let last = bytes.split(|b| *b == b'\n').count() - 1;

        for (idx, line) in bytes.split(|b| *b == b'\n').enumerate() {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            let line_number = idx as u64 + 1;
            match std::str::from_utf8(line)
                .ok()
                .and_then(|s| Self::parse(s, line_number))
            {
                Some(entry) => entries.push(entry),
                None if idx == last => {
                    tracing::trace!(line = line_number, "partial trailing record");
                }
                None => {
                    rejected += 1;
                    tracing::debug!(line = line_number, "skipping undecodable log record");
                }
            }
        }

        if entries.is_empty() && rejected > 0 {
            return Err(SourceError::Malformed { rejected });
        }

        Ok(entries)
    }

    /// Extract the level from the numeric `log_level` or a string `level`
    fn extract_level(obj: &Map<String, Value>) -> Option<LogLevel> {
        if let Some(n) = obj.get("log_level").and_then(Value::as_u64) {
            return LogLevel::from_lager(n);
        }
        obj.get("level")
            .and_then(Value::as_str)
            .and_then(LogLevel::from_str)
    }

    /// Parse epoch seconds (`"1452812345.123456789"` or a number) or RFC 3339
    fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
        match value {
            Value::String(s) => Self::parse_epoch(s).or_else(|| {
                DateTime::parse_from_rfc3339(s)
                    .ok()
                    .map(|ts| ts.with_timezone(&Utc))
            }),
            Value::Number(n) => {
                let secs = n.as_f64()?;
                let whole = secs.trunc();
                let nanos = ((secs - whole) * 1e9).round() as u32;
                DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
            }
            _ => None,
        }
    }

    fn parse_epoch(s: &str) -> Option<DateTime<Utc>> {
        let (secs, frac) = s.split_once('.').unwrap_or((s, ""));
        let secs: i64 = secs.parse().ok()?;
        if !frac.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        // Nanosecond precision at most
        let frac = &frac[..frac.len().min(9)];
        let nanos: u32 = if frac.is_empty() {
            0
        } else {
            format!("{:0<9}", frac).parse().ok()?
        };
        DateTime::from_timestamp(secs, nanos)
    }
}
