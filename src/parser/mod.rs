//! Bibliography item parsing.
//!
//! [`parse`] turns one page of BibTeX text, as returned by the Zotero API,
//! into [`BibItem`]s: the batch is split into records, each record keeps its
//! raw text and citation key, and a [`CitationStyler`] renders it.
//!
//! Rendering failures never abort a batch. An item that cannot be rendered
//! keeps `rendered: None`, and records without a citation key are skipped.

mod records;

pub use records::{extract_key, split_records};

use std::panic::{AssertUnwindSafe, catch_unwind};

use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::csl::CitationStyler;

/// One bibliography entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BibItem {
    /// Citation key from the record header.
    pub key: String,
    /// The record's BibTeX text.
    pub raw_record: String,
    /// HTML citation, or `None` when rendering failed.
    pub rendered: Option<String>,
}

impl BibItem {
    /// Returns true if a citation was rendered for this item.
    #[must_use]
    pub fn is_rendered(&self) -> bool {
        self.rendered.is_some()
    }
}

/// Parses a BibTeX batch and renders every record with `styler`.
///
/// Items are returned in the order their records appear in the batch.
#[instrument(skip(raw_batch, styler), fields(batch_len = raw_batch.len()))]
pub fn parse<S: CitationStyler>(raw_batch: &str, styler: &S) -> Vec<BibItem> {
    let mut keyed = Vec::new();
    for record in split_records(raw_batch) {
        match extract_key(record) {
            Some(key) => keyed.push((key, record)),
            None => warn!(record = %preview(record), "skipping BibTeX record without citation key"),
        }
    }
    if keyed.is_empty() {
        return Vec::new();
    }

    let source = match styler.load_source(raw_batch) {
        Ok(source) => Some(source),
        Err(error) => {
            warn!(error = %error, records = keyed.len(), "cannot load BibTeX batch; items stay unrendered");
            None
        }
    };

    let items: Vec<BibItem> = keyed
        .into_iter()
        .map(|(key, record)| BibItem {
            key: key.to_string(),
            raw_record: record.to_string(),
            rendered: source
                .as_ref()
                .and_then(|source| render_guarded(styler, source, key)),
        })
        .collect();

    debug!(
        items = items.len(),
        rendered = items.iter().filter(|item| item.is_rendered()).count(),
        "parsed BibTeX batch"
    );
    items
}

fn render_guarded<S: CitationStyler>(styler: &S, source: &S::Source, key: &str) -> Option<String> {
    match catch_unwind(AssertUnwindSafe(|| styler.render(source, key))) {
        Ok(Ok(rendered)) => Some(rendered),
        Ok(Err(error)) => {
            warn!(key, error = %error, "citation rendering failed");
            None
        }
        Err(_) => {
            warn!(key, "citation renderer panicked");
            None
        }
    }
}

fn preview(record: &str) -> String {
    const MAX_CHARS: usize = 60;
    let first_line = record.lines().next().unwrap_or_default();
    if first_line.chars().count() > MAX_CHARS {
        let truncated: String = first_line.chars().take(MAX_CHARS).collect();
        format!("{truncated}...")
    } else {
        first_line.to_string()
    }
}
