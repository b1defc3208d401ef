use std::fmt;

use serde_json::Value;

use crate::error::PatternError;
use logmatch_types::{LogData, LogEntry, LogLevel, render_data};

/// Error expectation of an error or fatal pattern
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ExpectedError {
    /// Error text is not checked
    #[default]
    Any,
    /// Entry must carry exactly this error text
    Message(String),
}

impl ExpectedError {
    pub fn any() -> Self {
        Self::Any
    }

    /// Expect the display text of `err`
    pub fn of<E: std::error::Error + ?Sized>(err: &E) -> Self {
        Self::Message(err.to_string())
    }
}

impl From<&str> for ExpectedError {
    fn from(s: &str) -> Self {
        Self::Message(s.to_string())
    }
}

impl From<String> for ExpectedError {
    fn from(s: String) -> Self {
        Self::Message(s)
    }
}

impl From<Option<&str>> for ExpectedError {
    fn from(s: Option<&str>) -> Self {
        s.map_or(Self::Any, Self::from)
    }
}

impl From<Option<String>> for ExpectedError {
    fn from(s: Option<String>) -> Self {
        s.map_or(Self::Any, Self::Message)
    }
}

/// A single field check applied to a pattern
#[derive(Clone, Debug, PartialEq)]
pub enum Constraint {
    Source(String),
    Message(String),
    Data(LogData),
}

/// Require the entry's source to equal `s`
pub fn source(s: impl Into<String>) -> Constraint {
    Constraint::Source(s.into())
}

/// Require the entry's message to equal `s`
pub fn message(s: impl Into<String>) -> Constraint {
    Constraint::Message(s.into())
}

/// Alias of [`message`]
pub fn action(s: impl Into<String>) -> Constraint {
    Constraint::Message(s.into())
}

/// Require the entry's data to contain every given key with an equal value
pub fn data<I, K, V>(pairs: I) -> Constraint
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    Constraint::Data(
        pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect(),
    )
}

/// Like [`data`], from a flat `key, value, key, value, ...` list
pub fn data_args<I, V>(args: I) -> Result<Constraint, PatternError>
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let args: Vec<Value> = args.into_iter().map(Into::into).collect();
    if args.len() % 2 != 0 {
        return Err(PatternError::OddDataArguments { count: args.len() });
    }

    let mut map = LogData::with_capacity(args.len() / 2);
    let mut args = args.into_iter().enumerate();
    while let (Some((position, key)), Some((_, value))) = (args.next(), args.next()) {
        match key {
            Value::String(key) => {
                map.insert(key, value);
            }
            other => {
                return Err(PatternError::NonStringKey {
                    position,
                    found: other.to_string(),
                });
            }
        }
    }

    Ok(Constraint::Data(map))
}

/// Build a data constraint from alternating keys and values
///
/// Expands to [`data_args`], so it yields a `Result`:
///
/// ```
/// use logmatch_matcher::{data, info};
///
/// let pattern = info([data!["event", "starting", "attempt", 2]?]);
/// # Ok::<(), logmatch_matcher::PatternError>(())
/// ```
#[macro_export]
macro_rules! data {
    ($($arg:expr),* $(,)?) => {
        $crate::data_args::<_, $crate::Value>([$($crate::Value::from($arg)),*])
    };
}

/// Expected log entry
///
/// Only the level is mandatory. Every other field is unconstrained until a
/// constraint is applied, and all applied constraints must hold.
#[derive(Clone, Debug, PartialEq)]
pub struct Pattern {
    level: LogLevel,
    error: ExpectedError,
    source: Option<String>,
    message: Option<String>,
    data: LogData,
}

pub fn debug(constraints: impl IntoIterator<Item = Constraint>) -> Pattern {
    Pattern::new(LogLevel::Debug).with_all(constraints)
}

pub fn info(constraints: impl IntoIterator<Item = Constraint>) -> Pattern {
    Pattern::new(LogLevel::Info).with_all(constraints)
}

pub fn error(
    err: impl Into<ExpectedError>,
    constraints: impl IntoIterator<Item = Constraint>,
) -> Pattern {
    Pattern::new(LogLevel::Error)
        .with_error(err)
        .with_all(constraints)
}

pub fn fatal(
    err: impl Into<ExpectedError>,
    constraints: impl IntoIterator<Item = Constraint>,
) -> Pattern {
    Pattern::new(LogLevel::Fatal)
        .with_error(err)
        .with_all(constraints)
}

impl Pattern {
    /// Empty pattern matching any entry of `level`
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            error: ExpectedError::Any,
            source: None,
            message: None,
            data: LogData::new(),
        }
    }

    /// Set the expected error. Ignored below error level.
    pub fn with_error(mut self, err: impl Into<ExpectedError>) -> Self {
        if self.level.carries_error() {
            self.error = err.into();
        }
        self
    }

    /// Apply a constraint: scalars are replaced, data keys are merged
    pub fn with(mut self, constraint: Constraint) -> Self {
        match constraint {
            Constraint::Source(s) => self.source = Some(s),
            Constraint::Message(m) => self.message = Some(m),
            Constraint::Data(d) => self.data.extend(d),
        }
        self
    }

    pub fn with_all(self, constraints: impl IntoIterator<Item = Constraint>) -> Self {
        constraints.into_iter().fold(self, Self::with)
    }

    pub fn with_source(self, s: impl Into<String>) -> Self {
        self.with(source(s))
    }

    pub fn with_message(self, m: impl Into<String>) -> Self {
        self.with(message(m))
    }

    pub fn with_action(self, a: impl Into<String>) -> Self {
        self.with(action(a))
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn expected_error(&self) -> &ExpectedError {
        &self.error
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn data(&self) -> &LogData {
        &self.data
    }

    /// Whether `entry` satisfies every check of this pattern
    pub fn matches(&self, entry: &LogEntry) -> bool {
        self.mismatch(entry).is_none()
    }

    /// First check that `entry` fails, if any
    ///
    /// Checks run in a fixed order: level, error, source, message, then
    /// data keys in sorted order.
    pub fn mismatch(&self, entry: &LogEntry) -> Option<Mismatch> {
        if entry.level != self.level {
            return Some(Mismatch::Level {
                expected: self.level,
                actual: entry.level,
            });
        }

        if let ExpectedError::Message(expected) = &self.error {
            if entry.error.as_deref() != Some(expected.as_str()) {
                return Some(Mismatch::Error {
                    expected: expected.clone(),
                    actual: entry.error.clone(),
                });
            }
        }

        if let Some(expected) = &self.source {
            if *expected != entry.source {
                return Some(Mismatch::Source {
                    expected: expected.clone(),
                    actual: entry.source.clone(),
                });
            }
        }

        if let Some(expected) = &self.message {
            if *expected != entry.message {
                return Some(Mismatch::Message {
                    expected: expected.clone(),
                    actual: entry.message.clone(),
                });
            }
        }

        let mut keys: Vec<&String> = self.data.keys().collect();
        keys.sort();
        for key in keys {
            let expected = &self.data[key];
            match entry.data.get(key) {
                None => return Some(Mismatch::MissingKey { key: key.clone() }),
                Some(actual) if actual != expected => {
                    return Some(Mismatch::DataValue {
                        key: key.clone(),
                        expected: expected.clone(),
                        actual: actual.clone(),
                    });
                }
                Some(_) => {}
            }
        }

        None
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields = Vec::new();
        if let ExpectedError::Message(err) = &self.error {
            fields.push(format!("error={:?}", err));
        }
        if let Some(source) = &self.source {
            fields.push(format!("source={:?}", source));
        }
        if let Some(message) = &self.message {
            fields.push(format!("message={:?}", message));
        }
        if !self.data.is_empty() {
            fields.push(format!("data={}", render_data(&self.data)));
        }
        write!(f, "{}({})", self.level, fields.join(", "))
    }
}

/// Why an entry was rejected by a pattern
#[derive(Clone, Debug, PartialEq)]
pub enum Mismatch {
    Level { expected: LogLevel, actual: LogLevel },
    Error { expected: String, actual: Option<String> },
    Source { expected: String, actual: String },
    Message { expected: String, actual: String },
    MissingKey { key: String },
    DataValue { key: String, expected: Value, actual: Value },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Level { expected, actual } => {
                write!(f, "level: expected {}, got {}", expected, actual)
            }
            Self::Error {
                expected,
                actual: Some(actual),
            } => write!(f, "error: expected {:?}, got {:?}", expected, actual),
            Self::Error {
                expected,
                actual: None,
            } => write!(f, "error: expected {:?}, got none", expected),
            Self::Source { expected, actual } => {
                write!(f, "source: expected {:?}, got {:?}", expected, actual)
            }
            Self::Message { expected, actual } => {
                write!(f, "message: expected {:?}, got {:?}", expected, actual)
            }
            Self::MissingKey { key } => write!(f, "data: missing key {:?}", key),
            Self::DataValue {
                key,
                expected,
                actual,
            } => write!(f, "data[{:?}]: expected {}, got {}", key, expected, actual),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(level: LogLevel) -> LogEntry {
        LogEntry::new(level, "svc", "svc.start")
            .with_data("k", "v")
            .with_data("other", "x")
    }

    #[test]
    fn test_empty_pattern_matches_level_only() {
        assert!(info([]).matches(&entry(LogLevel::Info)));
        assert!(!info([]).matches(&entry(LogLevel::Debug)));
        assert!(debug([]).matches(&entry(LogLevel::Debug)));
        assert!(!error(ExpectedError::Any, []).matches(&entry(LogLevel::Fatal)));
        assert!(fatal(None::<&str>, []).matches(&entry(LogLevel::Fatal)));
    }

    #[test]
    fn test_data_is_subset_match() {
        assert!(info([data([("k", "v")])]).matches(&entry(LogLevel::Info)));

        let only_other = LogEntry::new(LogLevel::Info, "svc", "svc.start").with_data("other", "x");
        assert_eq!(
            info([data([("k", "v")])]).mismatch(&only_other),
            Some(Mismatch::MissingKey {
                key: "k".to_string()
            })
        );

        let wrong = LogEntry::new(LogLevel::Info, "svc", "svc.start").with_data("k", "wrong");
        assert!(matches!(
            info([data([("k", "v")])]).mismatch(&wrong),
            Some(Mismatch::DataValue { .. })
        ));
    }

    #[test]
    fn test_data_values_compare_as_json() {
        let entry = LogEntry::new(LogLevel::Info, "svc", "svc.start").with_data("n", 3);
        assert!(info([data([("n", 3)])]).matches(&entry));
        assert!(!info([data([("n", "3")])]).matches(&entry));
    }

    #[test]
    fn test_error_identity() {
        let entry = LogEntry::new(LogLevel::Error, "svc", "svc.start").with_error("some-error");
        assert!(error("some-error", []).matches(&entry));
        assert!(!error("some-errors", []).matches(&entry));
        assert!(error(ExpectedError::any(), []).matches(&entry));
        assert_eq!(ExpectedError::any(), ExpectedError::from(None::<&str>));

        let io_err = std::io::Error::other("some-error");
        assert!(error(ExpectedError::of(&io_err), []).matches(&entry));
    }

    #[test]
    fn test_expected_error_requires_error_present() {
        let entry = LogEntry::new(LogLevel::Error, "svc", "svc.start");
        assert_eq!(
            error("boom", []).mismatch(&entry),
            Some(Mismatch::Error {
                expected: "boom".to_string(),
                actual: None
            })
        );
        assert!(error(ExpectedError::Any, []).matches(&entry));
    }

    #[test]
    fn test_action_is_message_alias() {
        let e = entry(LogLevel::Info);
        assert!(info([action("svc.start")]).matches(&e));
        assert_eq!(info([action("svc.start")]), info([message("svc.start")]));
    }

    #[test]
    fn test_scalar_constraints_last_write_wins() {
        let pattern = info([source("a"), source("svc"), message("x"), action("svc.start")]);
        assert_eq!(pattern.source(), Some("svc"));
        assert_eq!(pattern.message(), Some("svc.start"));
        assert!(pattern.matches(&entry(LogLevel::Info)));
    }

    #[test]
    fn test_data_constraints_merge() {
        let pattern = info([data([("k", "old")]), data([("other", "x")]), data([("k", "v")])]);
        assert_eq!(pattern.data().len(), 2);
        assert_eq!(pattern.data()["k"], Value::from("v"));
        assert!(pattern.matches(&entry(LogLevel::Info)));
    }

    #[test]
    fn test_constraint_order_is_irrelevant() {
        let a = info([source("svc"), data([("k", "v")]), message("svc.start")]);
        let b = Pattern::new(LogLevel::Info)
            .with_message("svc.start")
            .with_data("k", "v")
            .with_source("svc");
        assert_eq!(a, b);
    }

    #[test]
    fn test_error_ignored_on_info_pattern() {
        let pattern = Pattern::new(LogLevel::Info).with_error("boom");
        assert_eq!(pattern.expected_error(), &ExpectedError::Any);
    }

    #[test]
    fn test_data_args_validation() {
        assert_eq!(
            data_args(["k"]).unwrap_err(),
            PatternError::OddDataArguments { count: 1 }
        );
        assert!(matches!(
            data_args([Value::from(1), Value::from("v")]).unwrap_err(),
            PatternError::NonStringKey { position: 0, .. }
        ));
        assert_eq!(
            data_args(["k", "v", "a", "b"]).unwrap(),
            data([("k", "v"), ("a", "b")])
        );
        assert_eq!(data_args(Vec::<Value>::new()).unwrap(), Constraint::Data(LogData::new()));
    }

    #[test]
    fn test_data_macro() {
        let constraint = crate::data!["event", "starting", "attempt", 2].unwrap();
        assert_eq!(
            constraint,
            data([("event", Value::from("starting")), ("attempt", Value::from(2))])
        );
        assert!(crate::data!["lonely"].is_err());
    }

    #[test]
    fn test_mismatch_order() {
        let pattern = error("boom", [source("other"), data([("k", "nope")])]);
        let e = LogEntry::new(LogLevel::Error, "svc", "svc.start")
            .with_error("boom")
            .with_data("k", "v");
        assert!(matches!(pattern.mismatch(&e), Some(Mismatch::Source { .. })));
    }

    #[test]
    fn test_display() {
        assert_eq!(info([]).to_string(), "info()");
        let pattern = error("boom", [source("svc"), data([("env", "prod")])]);
        assert_eq!(
            pattern.to_string(),
            r#"error(error="boom", source="svc", data={"env":"prod"})"#
        );

        let mismatch = Mismatch::Error {
            expected: "a".to_string(),
            actual: None,
        };
        assert_eq!(mismatch.to_string(), r#"error: expected "a", got none"#);
    }
}
