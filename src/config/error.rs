//! Configuration errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating configuration.
///
/// All of them are fatal at startup; the collection walk never starts with
/// an invalid configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required option was not given by the settings file or command line.
    #[error("no {field} specified\n  Suggestion: pass {flag} or set `{field}` in the settings file")]
    MissingField {
        /// Settings key of the missing option.
        field: &'static str,
        /// Command-line flag that provides it.
        flag: &'static str,
    },

    /// An option was present but unusable.
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Settings key of the invalid option.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The settings file could not be read.
    #[error("cannot read settings file {path}: {source}")]
    Read {
        /// File that failed to read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid TOML or has unknown keys.
    #[error("invalid settings file {path}: {source}")]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    /// Creates a `MissingField` error.
    #[must_use]
    pub fn missing(field: &'static str, flag: &'static str) -> Self {
        Self::MissingField { field, flag }
    }

    /// Creates an `InvalidValue` error.
    #[must_use]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}
