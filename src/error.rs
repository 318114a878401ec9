//! Crate-level error type.

use thiserror::Error;

use crate::config::ConfigError;
use crate::output::OutputError;
use crate::style::StyleError;
use crate::tree::TreeError;
use crate::zotero::FetchError;

/// Any error that ends a bibliography run.
#[derive(Debug, Error)]
pub enum BibgenError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Style(#[from] StyleError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

impl BibgenError {
    /// Process exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Style(_) => 3,
            Self::Fetch(_) | Self::Tree(_) => 4,
            Self::Output(_) => 5,
        }
    }
}
