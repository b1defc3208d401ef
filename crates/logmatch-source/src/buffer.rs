use std::borrow::Cow;
use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::parser::LogParser;
use crate::producer::RecordSink;
use crate::provider::{BufferProvider, ContentsProvider, LogSource};
use logmatch_types::{LogEntry, LogLevel};

/// Thread-safe, append-only byte buffer
///
/// Clones share the same storage, so one clone can be handed to a writer
/// while another is used as a [`ContentsProvider`] for assertions.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<RwLock<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far
    pub fn snapshot(&self) -> Vec<u8> {
        self.bytes.read().clone()
    }

    pub fn len(&self) -> usize {
        self.bytes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.read().is_empty()
    }

    pub fn clear(&self) {
        self.bytes.write().clear();
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.write().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ContentsProvider for SharedBuffer {
    fn contents(&self) -> Cow<'_, [u8]> {
        Cow::Owned(self.snapshot())
    }
}

impl LogSource for SharedBuffer {
    fn as_contents_provider(&self) -> Option<&dyn ContentsProvider> {
        Some(self)
    }
}

impl std::fmt::Debug for SharedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedBuffer")
            .field("len", &self.len())
            .finish()
    }
}

/// Sink that records every serialized record for later assertions
#[derive(Clone, Debug, Default)]
pub struct TestSink {
    buffer: SharedBuffer,
}

impl TestSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode everything recorded so far
    pub fn logs(&self) -> Vec<LogEntry> {
        LogParser::decode(&self.buffer.snapshot()).unwrap_or_default()
    }

    /// Messages of every recorded entry, in order
    pub fn log_messages(&self) -> Vec<String> {
        self.logs().into_iter().map(|e| e.message).collect()
    }

    pub fn clear(&self) {
        self.buffer.clear();
    }
}

impl RecordSink for TestSink {
    fn log(&self, _level: LogLevel, line: &[u8]) {
        self.buffer.bytes.write().extend_from_slice(line);
    }
}

impl BufferProvider for TestSink {
    fn buffer(&self) -> Cow<'_, [u8]> {
        Cow::Owned(self.buffer.snapshot())
    }
}

impl LogSource for TestSink {
    fn as_buffer_provider(&self) -> Option<&dyn BufferProvider> {
        Some(self)
    }
}
