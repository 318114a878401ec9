//! Error types for citation style resolution and loading.

use std::path::PathBuf;

use thiserror::Error;

use crate::zotero::FetchError;

/// Errors that can occur while resolving or loading a citation style.
#[derive(Debug, Error)]
pub enum StyleError {
    /// The style name cannot be used as a file name.
    #[error("invalid citation style name '{name}': {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Downloading the style from the styles repository failed.
    #[error("cannot download citation style '{style}': {source}")]
    Download {
        /// Style that was requested.
        style: String,
        /// The underlying fetch error.
        #[source]
        source: FetchError,
    },

    /// The styles repository answered with something that is not a CSL document.
    #[error("response from {url} is not a usable CSL style: {reason}")]
    NotCsl {
        /// URL that was fetched.
        url: String,
        /// What the CSL parser reported.
        reason: String,
    },

    /// A style file could not be read or written.
    #[error("IO error on style file {path}: {source}")]
    Io {
        /// The style file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Neither the requested style nor the fallback style could be resolved.
    #[error(
        "citation style '{style}' is unavailable and fallback '{fallback}' could not be resolved: {source}\n  Suggestion: place {fallback}.csl in the styles directory or check network access"
    )]
    Unresolvable {
        /// Style that was requested.
        style: String,
        /// Fallback style that was tried last.
        fallback: String,
        /// Why the fallback failed.
        #[source]
        source: Box<StyleError>,
    },

    /// The style file exists but is not a usable CSL style.
    #[error("invalid CSL style {path}: {reason}")]
    InvalidStyle {
        /// The style file path.
        path: PathBuf,
        /// What the CSL parser reported.
        reason: String,
    },
}

impl StyleError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
