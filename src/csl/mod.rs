//! Citation rendering.
//!
//! [`CitationStyler`] is the seam between BibTeX parsing and a citation
//! engine: it loads a batch of BibTeX into an engine-specific source and
//! renders single entries from it as HTML. [`CslStyler`] implements it with
//! the `hayagriva` CSL processor.

use std::fs;

use hayagriva::citationberg::{IndependentStyle, Locale};
use hayagriva::io::from_biblatex_str;
use hayagriva::{
    BibliographyDriver, BibliographyRequest, BufWriteFormat, CitationItem, CitationRequest,
    Library,
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::parser::{extract_key, split_records};
use crate::style::{StyleDefinition, StyleError};

/// Errors produced while rendering a single citation.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The key is not present in the loaded source.
    #[error("no bibliography entry with key '{key}'")]
    UnknownKey {
        /// The requested key.
        key: String,
    },

    /// The BibTeX batch could not be loaded at all.
    #[error("cannot load BibTeX source: {reason}")]
    Source {
        /// What went wrong.
        reason: String,
    },

    /// The style produced no bibliography entry for the key.
    #[error("style '{style}' produced no bibliography entry for '{key}'")]
    NoEntry {
        /// The requested key.
        key: String,
        /// Name of the style used.
        style: String,
    },

    /// Writing the formatted output failed.
    #[error("cannot format citation for '{key}'")]
    Write {
        /// The requested key.
        key: String,
    },
}

/// Renders bibliography entries as HTML citations.
pub trait CitationStyler {
    /// Parsed form of a BibTeX batch.
    type Source;

    /// Loads a BibTeX batch so entries can be rendered by key.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Source`] when nothing in the batch can be loaded.
    fn load_source(&self, raw_batch: &str) -> Result<Self::Source, RenderError>;

    /// Renders the entry with citation key `key` as an HTML fragment.
    ///
    /// # Errors
    ///
    /// Returns a [`RenderError`] if the entry is missing or cannot be formatted.
    fn render(&self, source: &Self::Source, key: &str) -> Result<String, RenderError>;
}

/// Parsed BibTeX for [`CslStyler`].
///
/// Usually a single library; when a batch fails to parse as a whole, each
/// record is parsed on its own and the ones that parse are kept.
#[derive(Debug, Default)]
pub struct BibSource {
    libraries: Vec<Library>,
}

impl BibSource {
    fn get(&self, key: &str) -> Option<&hayagriva::Entry> {
        self.libraries.iter().find_map(|library| library.get(key))
    }
}

/// [`CitationStyler`] backed by a CSL style file.
pub struct CslStyler {
    name: String,
    style: IndependentStyle,
    locales: Vec<Locale>,
}

impl CslStyler {
    /// Loads the CSL style at `definition.path`.
    ///
    /// # Errors
    ///
    /// Returns [`StyleError::Io`] if the file cannot be read and
    /// [`StyleError::InvalidStyle`] if it is not an independent CSL style.
    pub fn from_definition(definition: &StyleDefinition) -> Result<Self, StyleError> {
        let xml = fs::read_to_string(&definition.path)
            .map_err(|source| StyleError::io(&definition.path, source))?;
        let style = IndependentStyle::from_xml(&xml).map_err(|error| StyleError::InvalidStyle {
            path: definition.path.clone(),
            reason: error.to_string(),
        })?;
        debug!(style = %definition.name, path = %definition.path.display(), "loaded CSL style");

        Ok(Self {
            name: definition.name.clone(),
            style,
            locales: hayagriva::archive::locales(),
        })
    }

    /// Name of the loaded style.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for CslStyler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CslStyler")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl CitationStyler for CslStyler {
    type Source = BibSource;

    fn load_source(&self, raw_batch: &str) -> Result<BibSource, RenderError> {
        let errors = match from_biblatex_str(raw_batch) {
            Ok(library) => {
                return Ok(BibSource {
                    libraries: vec![library],
                });
            }
            Err(errors) => errors,
        };
        debug!(
            errors = errors.len(),
            "BibTeX batch does not parse as a whole; parsing records one by one"
        );

        let libraries: Vec<Library> = split_records(raw_batch)
            .into_iter()
            .filter_map(|record| match from_biblatex_str(record) {
                Ok(library) => Some(library),
                Err(errors) => {
                    warn!(
                        key = extract_key(record).unwrap_or("<none>"),
                        errors = errors.len(),
                        "cannot parse BibTeX record"
                    );
                    None
                }
            })
            .collect();

        if libraries.is_empty() {
            return Err(RenderError::Source {
                reason: format!("{} BibTeX parse error(s), no record could be read", errors.len()),
            });
        }
        Ok(BibSource { libraries })
    }

    fn render(&self, source: &BibSource, key: &str) -> Result<String, RenderError> {
        let entry = source.get(key).ok_or_else(|| RenderError::UnknownKey {
            key: key.to_string(),
        })?;

        let mut driver = BibliographyDriver::new();
        let items = vec![CitationItem::with_entry(entry)];
        driver.citation(CitationRequest::from_items(items, &self.style, &self.locales));
        let rendered = driver.finish(BibliographyRequest {
            style: &self.style,
            locale: None,
            locale_files: &self.locales,
        });

        let no_entry = || RenderError::NoEntry {
            key: key.to_string(),
            style: self.name.clone(),
        };
        let bibliography = rendered.bibliography.ok_or_else(no_entry)?;
        let item = bibliography.items.into_iter().next().ok_or_else(no_entry)?;

        let write_failed = |_| RenderError::Write {
            key: key.to_string(),
        };
        let mut html = String::new();
        if let Some(first_field) = &item.first_field {
            first_field
                .write_buf(&mut html, BufWriteFormat::Html)
                .map_err(write_failed)?;
            html.push(' ');
        }
        item.content
            .write_buf(&mut html, BufWriteFormat::Html)
            .map_err(write_failed)?;
        Ok(html)
    }
}
