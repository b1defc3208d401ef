//! Error types for log extraction.

use thiserror::Error;

/// Errors that prevent a log source from being read at all.
///
/// These are usage errors. A source that decodes fine but does not hold
/// the expected entries is never reported through this type.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The value is none of buffer provider, contents provider or reader.
    #[error(
        "log source must be a buffer provider, contents provider or reader, got `{type_name}`"
    )]
    Unsupported { type_name: &'static str },

    /// Not a single line of non-empty content decoded as a log record.
    #[error("log content is not line-delimited structured JSON ({rejected} lines rejected)")]
    Malformed { rejected: usize },

    /// Reading a stream source failed.
    #[error("I/O error reading log stream: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for source operations.
pub type Result<T> = std::result::Result<T, SourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_names_type() {
        let err = SourceError::Unsupported { type_name: "&str" };
        assert!(err.to_string().contains("`&str`"));
        assert!(err.to_string().contains("buffer provider"));
    }

    #[test]
    fn test_malformed_reports_count() {
        let err = SourceError::Malformed { rejected: 3 };
        assert!(err.to_string().contains("3 lines rejected"));
    }

    #[test]
    fn test_io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: SourceError = io_err.into();
        assert!(matches!(err, SourceError::Io(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SourceError>();
    }
}
