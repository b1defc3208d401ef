use std::fmt::Write as _;

use crate::error::MatchError;
use crate::pattern::Pattern;
use crate::sequence::{Missing, find_sequence, near_misses};
use logmatch_source::{LogSource, extract_entries};
use logmatch_types::LogEntry;

/// Matcher asserting that logs contain patterns in order
///
/// Entries in between matched ones are ignored. Each match re-extracts
/// the entries from the given source, so buffer and contents providers
/// can be asserted against repeatedly while a stream only yields its
/// entries to the first attempt.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContainSequence {
    patterns: Vec<Pattern>,
}

/// Build a [`ContainSequence`] matcher
pub fn contain_sequence(patterns: impl IntoIterator<Item = Pattern>) -> ContainSequence {
    ContainSequence {
        patterns: patterns.into_iter().collect(),
    }
}

/// Alias of [`contain_sequence`]
pub fn have_logged(patterns: impl IntoIterator<Item = Pattern>) -> ContainSequence {
    contain_sequence(patterns)
}

impl ContainSequence {
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Whether `actual` contains the sequence
    ///
    /// `Err` is reserved for usage errors; a sequence that is not present
    /// is `Ok(false)`.
    pub fn matches<S: LogSource + ?Sized>(&self, actual: &mut S) -> Result<bool, MatchError> {
        Ok(self.evaluate(actual)?.matched())
    }

    /// Run the match and keep everything needed to explain the outcome
    pub fn evaluate<S: LogSource + ?Sized>(
        &self,
        actual: &mut S,
    ) -> Result<SequenceReport<'_>, MatchError> {
        let entries = extract_entries(actual)?;
        let outcome = find_sequence(&entries, &self.patterns);
        Ok(SequenceReport {
            patterns: &self.patterns,
            entries,
            outcome,
        })
    }

    /// Panic with the failure message unless `actual` contains the sequence
    #[track_caller]
    pub fn assert_in<S: LogSource + ?Sized>(&self, actual: &mut S) {
        match self.evaluate(actual) {
            Ok(report) if report.matched() => {}
            Ok(report) => panic!("{}", report.failure_message()),
            Err(err) => panic!("{}", err),
        }
    }

    /// Panic with the negated failure message if `actual` contains the sequence
    #[track_caller]
    pub fn assert_not_in<S: LogSource + ?Sized>(&self, actual: &mut S) {
        match self.evaluate(actual) {
            Ok(report) if !report.matched() => {}
            Ok(report) => panic!("{}", report.negated_failure_message()),
            Err(err) => panic!("{}", err),
        }
    }
}

/// Check `expected` against the entries held by `actual`
pub fn matches<S: LogSource + ?Sized>(
    actual: &mut S,
    expected: &[Pattern],
) -> Result<bool, MatchError> {
    let entries = extract_entries(actual)?;
    Ok(find_sequence(&entries, expected).is_ok())
}

/// Outcome of one match attempt
#[derive(Debug)]
pub struct SequenceReport<'m> {
    patterns: &'m [Pattern],
    entries: Vec<LogEntry>,
    outcome: Result<Vec<usize>, Missing>,
}

impl SequenceReport<'_> {
    pub fn matched(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Entry index bound to each pattern, when the sequence was found
    pub fn bindings(&self) -> Option<&[usize]> {
        self.outcome.as_deref().ok()
    }

    pub fn missing(&self) -> Option<Missing> {
        self.outcome.as_ref().err().copied()
    }

    /// Entries extracted for this attempt
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Explain why the sequence was not found
    pub fn failure_message(&self) -> String {
        let mut out = self.render("to contain the sequence");

        if let Err(missing) = &self.outcome {
            let pattern = &self.patterns[missing.pattern];
            let _ = writeln!(
                out,
                "but pattern #{} {} was not found at or after entry #{}",
                missing.pattern, pattern, missing.cursor
            );
            for (idx, _, mismatch) in near_misses(&self.entries, pattern, missing.cursor) {
                let _ = writeln!(out, "    entry #{} rejected: {}", idx, mismatch);
            }
        }

        out
    }

    /// Explain where the sequence was found
    pub fn negated_failure_message(&self) -> String {
        let mut out = self.render("not to contain the sequence");

        if let Ok(bindings) = &self.outcome {
            let _ = writeln!(out, "but it was found at entries {:?}", bindings);
        }

        out
    }

    fn render(&self, expectation: &str) -> String {
        let mut out = String::from("Expected log entries\n");
        if self.entries.is_empty() {
            out.push_str("    <no log entries>\n");
        }
        for (idx, entry) in self.entries.iter().enumerate() {
            let _ = writeln!(out, "    #{}: {}", idx, entry);
        }

        let _ = writeln!(out, "{}", expectation);
        if self.patterns.is_empty() {
            out.push_str("    <empty>\n");
        }
        for (idx, pattern) in self.patterns.iter().enumerate() {
            let _ = writeln!(out, "    #{}: {}", idx, pattern);
        }

        out
    }
}
