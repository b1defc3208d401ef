//! Log entry extraction for logmatch
//!
//! This crate turns buffers, snapshots and byte streams of line-delimited
//! structured logs into ordered [`LogEntry`] sequences, and provides the
//! in-memory sinks and producer used to generate such logs in tests.

mod buffer;
mod error;
mod parser;
mod producer;
mod provider;

pub use buffer::{SharedBuffer, TestSink};
pub use error::{Result, SourceError};
pub use parser::LogParser;
pub use producer::{Logger, RecordSink, WriterSink, log_data};
pub use provider::{BufferProvider, ContentsProvider, LogSource, Stream, extract_entries};

// Re-export types used in our public API
pub use logmatch_types::{LogData, LogEntry, LogLevel};
