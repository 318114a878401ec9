//! Splitting a BibTeX export into individual records.

use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::expect_used)]
static RECORD_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*@").expect("record start regex is valid"));
#[allow(clippy::expect_used)]
static RECORD_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@\s*\w+\s*\{([^,]+),").expect("record key regex is valid"));

/// Splits a BibTeX batch into record fragments.
///
/// A record starts with `@` at the beginning of a line; each fragment runs
/// up to the next record start and keeps its leading `@`. Text before the
/// first record and surrounding whitespace are dropped.
#[must_use]
pub fn split_records(raw_batch: &str) -> Vec<&str> {
    let starts: Vec<usize> = RECORD_START
        .find_iter(raw_batch)
        .map(|found| found.end() - 1)
        .collect();

    starts
        .iter()
        .enumerate()
        .map(|(index, &start)| {
            let end = starts.get(index + 1).copied().unwrap_or(raw_batch.len());
            raw_batch[start..end].trim()
        })
        .filter(|fragment| !fragment.is_empty())
        .collect()
}

/// Extracts the citation key of a record: the text between the first `{`
/// and the first `,`, trimmed. Returns `None` when there is no non-empty key.
#[must_use]
pub fn extract_key(record: &str) -> Option<&str> {
    let captures = RECORD_KEY.captures(record)?;
    let key = captures.get(1)?.as_str().trim();
    if key.is_empty() || key.contains(['{', '}']) {
        None
    } else {
        Some(key)
    }
}
