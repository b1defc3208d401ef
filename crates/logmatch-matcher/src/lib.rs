//! Ordered subsequence assertions over structured logs
//!
//! Build expected entries with [`debug`], [`info`], [`error`] and
//! [`fatal`], narrow them with [`source`], [`message`], [`action`] and
//! [`data`], then check them against anything implementing
//! [`LogSource`]:
//!
//! ```
//! use logmatch_matcher::{contain_sequence, data, error, info, source};
//! use logmatch_matcher::{Logger, TestSink, log_data};
//!
//! let mut sink = TestSink::new();
//! let logger = Logger::new("svc");
//! logger.register_sink(sink.clone());
//! logger.info("start", log_data([("env", "prod")]));
//! logger.error("start", "boom", log_data([("env", "prod")]));
//!
//! let matcher = contain_sequence([
//!     info([data([("env", "prod")])]),
//!     error("boom", [source("svc")]),
//! ]);
//! assert!(matcher.matches(&mut sink).unwrap());
//! ```

mod error;
mod matcher;
mod pattern;
mod sequence;

pub use error::{MatchError, PatternError};
pub use matcher::{ContainSequence, SequenceReport, contain_sequence, have_logged, matches};
pub use pattern::{
    Constraint, ExpectedError, Mismatch, Pattern, action, data, data_args, debug, error, fatal,
    info, message, source,
};
pub use sequence::{Missing, find_sequence, near_misses};

// Re-export the source side so one import covers both halves
pub use logmatch_source::{
    BufferProvider, ContentsProvider, LogData, LogEntry, LogLevel, LogSource, Logger, RecordSink,
    SharedBuffer, SourceError, Stream, TestSink, WriterSink, extract_entries, log_data,
};
pub use serde_json::Value;
