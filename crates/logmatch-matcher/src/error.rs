use thiserror::Error;

use logmatch_source::SourceError;

/// Invalid pattern construction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("data expects alternating keys and values, got {count} arguments")]
    OddDataArguments { count: usize },

    #[error("data key at argument {position} must be a string, got {found}")]
    NonStringKey { position: usize, found: String },
}

/// Usage errors surfaced by the matcher
///
/// A completed comparison never produces one of these, whatever its
/// outcome.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] PatternError),
}
