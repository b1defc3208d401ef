//! Resolution of "actual" values into ordered log entries.
//!
//! A value can hand over its log bytes in one of three ways, checked in
//! this order:
//!
//! 1. [`BufferProvider`]: re-supplies everything buffered so far
//! 2. [`ContentsProvider`]: exposes a full snapshot of its bytes
//! 3. [`std::io::Read`]: a forward-only stream, consumed on first use
//!
//! The first two are re-read from the start on every extraction, so
//! repeated assertions against the same value each see its current
//! content. A stream is drained once; extracting from it again yields no
//! entries.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Stdin, StdinLock};
use std::process::ChildStdout;

use crate::error::{Result, SourceError};
use crate::parser::LogParser;
use logmatch_types::LogEntry;

/// A value that re-supplies its accumulated bytes without consuming them
pub trait BufferProvider {
    fn buffer(&self) -> Cow<'_, [u8]>;
}

/// A value that exposes a snapshot of its full byte content
pub trait ContentsProvider {
    fn contents(&self) -> Cow<'_, [u8]>;
}

/// Capability dispatch for anything that may hold structured logs
///
/// Every method defaults to "not supported". Implementors override the
/// one capability they have.
pub trait LogSource {
    fn as_buffer_provider(&self) -> Option<&dyn BufferProvider> {
        None
    }

    fn as_contents_provider(&self) -> Option<&dyn ContentsProvider> {
        None
    }

    fn as_reader(&mut self) -> Option<&mut dyn Read> {
        None
    }

    /// Type name used in usage errors
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Extract the ordered entries held by `source`
pub fn extract_entries<S: LogSource + ?Sized>(source: &mut S) -> Result<Vec<LogEntry>> {
    if let Some(provider) = source.as_buffer_provider() {
        let bytes = provider.buffer();
        tracing::debug!(shape = "buffer", bytes = bytes.len(), "extracting log entries");
        return LogParser::decode(&bytes);
    }

    if let Some(provider) = source.as_contents_provider() {
        let bytes = provider.contents();
        tracing::debug!(shape = "contents", bytes = bytes.len(), "extracting log entries");
        return LogParser::decode(&bytes);
    }

    let type_name = source.type_name();
    if let Some(reader) = source.as_reader() {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        tracing::debug!(shape = "stream", bytes = bytes.len(), "extracting log entries");
        return LogParser::decode(&bytes);
    }

    tracing::debug!(type_name, "unsupported log source");
    Err(SourceError::Unsupported { type_name })
}

/// Wraps any reader as a one-shot log source
#[derive(Debug)]
pub struct Stream<R> {
    inner: R,
}

impl<R: Read> Stream<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> LogSource for Stream<R> {
    fn as_reader(&mut self) -> Option<&mut dyn Read> {
        Some(&mut self.inner)
    }
}

impl<R: Read> LogSource for BufReader<R> {
    fn as_reader(&mut self) -> Option<&mut dyn Read> {
        Some(self)
    }
}

impl<T: AsRef<[u8]>> LogSource for Cursor<T> {
    fn as_reader(&mut self) -> Option<&mut dyn Read> {
        Some(self)
    }
}

macro_rules! reader_source {
    ($($ty:ty),* $(,)?) => {
        $(
            impl LogSource for $ty {
                fn as_reader(&mut self) -> Option<&mut dyn Read> {
                    Some(self)
                }
            }
        )*
    };
}

reader_source!(File, Stdin, StdinLock<'_>, ChildStdout);

impl ContentsProvider for Vec<u8> {
    fn contents(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self)
    }
}

impl LogSource for Vec<u8> {
    fn as_contents_provider(&self) -> Option<&dyn ContentsProvider> {
        Some(self)
    }
}

impl<T: LogSource + ?Sized> LogSource for &mut T {
    fn as_buffer_provider(&self) -> Option<&dyn BufferProvider> {
        (**self).as_buffer_provider()
    }

    fn as_contents_provider(&self) -> Option<&dyn ContentsProvider> {
        (**self).as_contents_provider()
    }

    fn as_reader(&mut self) -> Option<&mut dyn Read> {
        (**self).as_reader()
    }

    fn type_name(&self) -> &'static str {
        (**self).type_name()
    }
}

impl<T: LogSource + ?Sized> LogSource for Box<T> {
    fn as_buffer_provider(&self) -> Option<&dyn BufferProvider> {
        (**self).as_buffer_provider()
    }

    fn as_contents_provider(&self) -> Option<&dyn ContentsProvider> {
        (**self).as_contents_provider()
    }

    fn as_reader(&mut self) -> Option<&mut dyn Read> {
        (**self).as_reader()
    }

    fn type_name(&self) -> &'static str {
        (**self).type_name()
    }
}

// Values that never hold logs. They are accepted by the type system so
// that passing one is reported as a usage error instead of a compile error
// deep inside generic assertion code.
macro_rules! unsupported_source {
    ($($ty:ty),* $(,)?) => {
        $(impl LogSource for $ty {})*
    };
}

unsupported_source!(
    str,
    &str,
    String,
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    isize,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64,
    (),
    serde_json::Value,
);

#[cfg(test)]
mod tests {
    use super::*;
    use logmatch_types::LogLevel;

    const LINE: &str =
        r#"{"timestamp":"1.0","source":"svc","message":"svc.start","log_level":1,"data":{}}"#;

    struct Both(Vec<u8>);

    impl BufferProvider for Both {
        fn buffer(&self) -> Cow<'_, [u8]> {
            Cow::Borrowed(&self.0)
        }
    }

    impl ContentsProvider for Both {
        fn contents(&self) -> Cow<'_, [u8]> {
            Cow::Borrowed(b"")
        }
    }

    impl LogSource for Both {
        fn as_buffer_provider(&self) -> Option<&dyn BufferProvider> {
            Some(self)
        }

        fn as_contents_provider(&self) -> Option<&dyn ContentsProvider> {
            Some(self)
        }
    }

    #[test]
    fn test_contents_provider_is_rescannable() {
        let mut bytes = LINE.as_bytes().to_vec();
        assert_eq!(extract_entries(&mut bytes).unwrap().len(), 1);
        assert_eq!(extract_entries(&mut bytes).unwrap().len(), 1);
    }

    #[test]
    fn test_stream_is_consumed_once() {
        let mut stream = Stream::new(LINE.as_bytes());
        let first = extract_entries(&mut stream).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].level, LogLevel::Info);
        assert!(extract_entries(&mut stream).unwrap().is_empty());
        assert!(stream.into_inner().is_empty());
    }

    #[test]
    fn test_file_is_a_stream() {
        let path = std::env::temp_dir().join(format!("logmatch-provider-{}.log", std::process::id()));
        std::fs::write(&path, format!("{LINE}\n")).unwrap();

        let mut file = File::open(&path).unwrap();
        assert_eq!(extract_entries(&mut file).unwrap().len(), 1);
        assert!(extract_entries(&mut file).unwrap().is_empty());

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_cursor_and_bufreader_are_streams() {
        let mut cursor = Cursor::new(LINE.to_string());
        assert_eq!(extract_entries(&mut cursor).unwrap().len(), 1);
        assert!(extract_entries(&mut cursor).unwrap().is_empty());

        let mut reader = BufReader::new(LINE.as_bytes());
        assert_eq!(extract_entries(&mut reader).unwrap().len(), 1);
        assert!(extract_entries(&mut reader).unwrap().is_empty());
    }

    #[test]
    fn test_buffer_provider_wins_over_contents_provider() {
        let mut both = Both(LINE.as_bytes().to_vec());
        assert_eq!(extract_entries(&mut both).unwrap().len(), 1);
    }

    #[test]
    fn test_unsupported_types_are_usage_errors() {
        let err = extract_entries(&mut "foo").unwrap_err();
        match err {
            SourceError::Unsupported { type_name } => assert_eq!(type_name, "&str"),
            other => panic!("unexpected error: {other}"),
        }

        let err = extract_entries(&mut 42_i32).unwrap_err();
        assert!(matches!(err, SourceError::Unsupported { type_name: "i32" }));

        let err = extract_entries(&mut String::from("foo")).unwrap_err();
        assert!(err.to_string().contains("String"));
    }

    #[test]
    fn test_forwarding_impls_keep_type_name() {
        let mut value = true;
        let mut by_ref = &mut value;
        let err = extract_entries(&mut by_ref).unwrap_err();
        assert!(matches!(err, SourceError::Unsupported { type_name: "bool" }));

        let mut boxed: Box<dyn LogSource> = Box::new(LINE.as_bytes().to_vec());
        assert_eq!(extract_entries(&mut boxed).unwrap().len(), 1);
    }

    #[test]
    fn test_stream_read_failure_is_io_error() {
        struct Failing;

        impl Read for Failing {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk gone"))
            }
        }

        let err = extract_entries(&mut Stream::new(Failing)).unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
    }
}
