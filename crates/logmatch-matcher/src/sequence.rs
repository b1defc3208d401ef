use crate::pattern::{Mismatch, Pattern};
use logmatch_types::LogEntry;

/// The first pattern with no matching entry at or after `cursor`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Missing {
    /// Index into the pattern list
    pub pattern: usize,
    /// Index of the first entry that was still eligible
    pub cursor: usize,
}

/// Find `patterns` as an ordered subsequence of `entries`
///
/// Greedy single pass: each pattern binds to the earliest matching entry
/// after the previous binding. Returns the bound entry index per pattern,
/// strictly increasing. An empty pattern list always succeeds.
pub fn find_sequence(entries: &[LogEntry], patterns: &[Pattern]) -> Result<Vec<usize>, Missing> {
    let mut cursor = 0;
    let mut bindings = Vec::with_capacity(patterns.len());

    for (idx, pattern) in patterns.iter().enumerate() {
        match entries[cursor..].iter().position(|e| pattern.matches(e)) {
            Some(offset) => {
                let bound = cursor + offset;
                tracing::trace!(index = idx, entry = bound, "pattern bound");
                bindings.push(bound);
                cursor = bound + 1;
            }
            None => {
                tracing::debug!(index = idx, cursor, %pattern, "pattern not found");
                return Err(Missing {
                    pattern: idx,
                    cursor,
                });
            }
        }
    }

    Ok(bindings)
}

/// Entries at or after `cursor` with the pattern's level, and why each
/// was rejected
pub fn near_misses<'e>(
    entries: &'e [LogEntry],
    pattern: &Pattern,
    cursor: usize,
) -> Vec<(usize, &'e LogEntry, Mismatch)> {
    entries
        .iter()
        .enumerate()
        .skip(cursor)
        .filter(|(_, e)| e.level == pattern.level())
        .filter_map(|(idx, e)| pattern.mismatch(e).map(|m| (idx, e, m)))
        .collect()
}
