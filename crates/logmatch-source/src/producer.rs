//! A minimal lager-style log producer.
//!
//! Writes one JSON record per event in the format [`LogParser`] decodes,
//! so code under test and assertions can share an in-memory sink.
//!
//! [`LogParser`]: crate::LogParser

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::Value;

use logmatch_types::{LogData, LogLevel};

/// Destination for serialized log records
pub trait RecordSink: Send + Sync {
    /// Receive one newline-terminated record
    fn log(&self, level: LogLevel, line: &[u8]);
}

/// Sink that writes records at or above `min_level` to a writer
pub struct WriterSink<W> {
    writer: Mutex<W>,
    min_level: LogLevel,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W, min_level: LogLevel) -> Self {
        Self {
            writer: Mutex::new(writer),
            min_level,
        }
    }
}

impl<W: Write + Send> RecordSink for WriterSink<W> {
    fn log(&self, level: LogLevel, line: &[u8]) {
        if level < self.min_level {
            return;
        }
        if let Err(err) = self.writer.lock().write_all(line) {
            tracing::warn!(%err, "failed to write log record");
        }
    }
}

#[derive(Serialize)]
struct WireRecord<'a> {
    timestamp: String,
    source: &'a str,
    message: String,
    log_level: u8,
    data: &'a LogData,
}

/// Component-tagged logger fanning records out to registered sinks
#[derive(Clone)]
pub struct Logger {
    component: String,
    task: String,
    sinks: Arc<RwLock<Vec<Arc<dyn RecordSink>>>>,
}

impl Logger {
    pub fn new(component: impl Into<String>) -> Self {
        let component = component.into();
        Self {
            task: component.clone(),
            component,
            sinks: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn register_sink(&self, sink: impl RecordSink + 'static) {
        self.sinks.write().push(Arc::new(sink));
    }

    /// Child logger whose messages are prefixed with `task`
    ///
    /// The child shares sinks with its parent and keeps the parent's source.
    pub fn session(&self, task: &str) -> Self {
        Self {
            component: self.component.clone(),
            task: format!("{}.{}", self.task, task),
            sinks: Arc::clone(&self.sinks),
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn debug(&self, action: &str, data: LogData) {
        self.emit(LogLevel::Debug, action, data);
    }

    pub fn info(&self, action: &str, data: LogData) {
        self.emit(LogLevel::Info, action, data);
    }

    pub fn error(&self, action: &str, err: impl fmt::Display, mut data: LogData) {
        data.insert("error".to_string(), Value::String(err.to_string()));
        self.emit(LogLevel::Error, action, data);
    }

    /// Record a fatal entry. Unlike lager this neither panics nor exits.
    pub fn fatal(&self, action: &str, err: impl fmt::Display, mut data: LogData) {
        data.insert("error".to_string(), Value::String(err.to_string()));
        self.emit(LogLevel::Fatal, action, data);
    }

    fn emit(&self, level: LogLevel, action: &str, data: LogData) {
        let now = Utc::now();
        let record = WireRecord {
            timestamp: format!("{}.{:09}", now.timestamp(), now.timestamp_subsec_nanos()),
            source: &self.component,
            message: format!("{}.{}", self.task, action),
            log_level: level.as_lager(),
            data: &data,
        };

        let mut line = match serde_json::to_vec(&record) {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!(%err, action, "failed to serialize log record");
                return;
            }
        };
        line.push(b'\n');

        // Sinks may register further sinks on this logger
        let sinks = self.sinks.read().clone();
        for sink in &sinks {
            sink.log(level, &line);
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("component", &self.component)
            .field("task", &self.task)
            .field("sinks", &self.sinks.read().len())
            .finish()
    }
}

/// Build a [`LogData`] map from key/value pairs
pub fn log_data<I, K, V>(pairs: I) -> LogData
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
