//! Expectation files: an ordered list of expected log entries in TOML.
//!
//! ```toml
//! [[expect]]
//! level = "info"
//! source = "svc"
//! data = { env = "prod" }
//!
//! [[expect]]
//! level = "error"
//! error = "boom"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use logmatch_matcher::{LogLevel, Pattern};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid expectation file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("expectation #{index}: `error` is only allowed on error and fatal entries, not {level}")]
    ErrorOnLevel { index: usize, level: LogLevel },

    #[error("expectation #{index}: set either `message` or `action`, not both")]
    MessageAndAction { index: usize },

    #[error("expectation #{index}: data value for {key:?} cannot be represented as JSON")]
    DataValue { index: usize, key: String },
}

/// Parsed expectation file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectationFile {
    #[serde(default)]
    pub expect: Vec<EntrySpec>,
}

/// One expected entry
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntrySpec {
    pub level: LogLevel,
    pub error: Option<String>,
    pub source: Option<String>,
    pub message: Option<String>,
    pub action: Option<String>,
    #[serde(default)]
    pub data: toml::Table,
}

impl ExpectationFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Convert to matcher patterns, preserving order
    pub fn to_patterns(&self) -> Result<Vec<Pattern>, ConfigError> {
        self.expect
            .iter()
            .enumerate()
            .map(|(index, spec)| spec.to_pattern(index))
            .collect()
    }
}

impl EntrySpec {
    fn to_pattern(&self, index: usize) -> Result<Pattern, ConfigError> {
        let mut pattern = Pattern::new(self.level);

        if let Some(err) = &self.error {
            if !self.level.carries_error() {
                return Err(ConfigError::ErrorOnLevel {
                    index,
                    level: self.level,
                });
            }
            pattern = pattern.with_error(err.as_str());
        }

        if let Some(source) = &self.source {
            pattern = pattern.with_source(source.as_str());
        }

        match (&self.message, &self.action) {
            (Some(_), Some(_)) => return Err(ConfigError::MessageAndAction { index }),
            (Some(message), None) => pattern = pattern.with_message(message.as_str()),
            (None, Some(action)) => pattern = pattern.with_action(action.as_str()),
            (None, None) => {}
        }

        for (key, value) in &self.data {
            let value = serde_json::to_value(value).map_err(|_| ConfigError::DataValue {
                index,
                key: key.clone(),
            })?;
            pattern = pattern.with_data(key.as_str(), value);
        }

        Ok(pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logmatch_matcher::{ExpectedError, Value};

    #[test]
    fn test_parse_expectations_in_order() {
        let file = ExpectationFile::parse(
            r#"
            [[expect]]
            level = "info"
            source = "svc"
            data = { env = "prod", replicas = 3 }

            [[expect]]
            level = "error"
            error = "boom"
            action = "svc.start"
            "#,
        )
        .unwrap();

        let patterns = file.to_patterns().unwrap();
        assert_eq!(patterns.len(), 2);

        assert_eq!(patterns[0].level(), LogLevel::Info);
        assert_eq!(patterns[0].source(), Some("svc"));
        assert_eq!(patterns[0].data()["env"], Value::from("prod"));
        assert_eq!(patterns[0].data()["replicas"], Value::from(3));

        assert_eq!(patterns[1].level(), LogLevel::Error);
        assert_eq!(
            patterns[1].expected_error(),
            &ExpectedError::Message("boom".to_string())
        );
        assert_eq!(patterns[1].message(), Some("svc.start"));
    }

    #[test]
    fn test_empty_file_has_no_patterns() {
        let file = ExpectationFile::parse("").unwrap();
        assert!(file.to_patterns().unwrap().is_empty());
    }

    #[test]
    fn test_error_rejected_on_info() {
        let file = ExpectationFile::parse(
            r#"
            [[expect]]
            level = "info"
            error = "boom"
            "#,
        )
        .unwrap();
        assert!(matches!(
            file.to_patterns().unwrap_err(),
            ConfigError::ErrorOnLevel { index: 0, .. }
        ));
    }

    #[test]
    fn test_message_and_action_conflict() {
        let file = ExpectationFile::parse(
            r#"
            [[expect]]
            level = "debug"
            message = "a"
            action = "b"
            "#,
        )
        .unwrap();
        assert!(matches!(
            file.to_patterns().unwrap_err(),
            ConfigError::MessageAndAction { index: 0 }
        ));
    }

    #[test]
    fn test_unknown_fields_and_levels_rejected() {
        assert!(ExpectationFile::parse("[[expect]]\nlevel = \"warn\"\n").is_err());
        assert!(ExpectationFile::parse("[[expect]]\nlevel = \"info\"\ncolour = 1\n").is_err());
    }
}
