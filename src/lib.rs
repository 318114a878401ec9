//! Bibliography generator core library.
//!
//! Builds a static HTML bibliography from a Zotero library: collections
//! become nested sections, and the items of each leaf collection are
//! rendered as citations in a CSL style.
//!
//! # Architecture
//!
//! - [`config`] - Layered configuration (defaults, settings file, CLI)
//! - [`session`] - Lazily created connection to one library
//! - [`zotero`] - Zotero Web API client behind the [`LibraryApi`] trait
//! - [`style`] - CSL style lookup, download and fallback
//! - [`csl`] - Citation rendering behind the [`CitationStyler`] trait
//! - [`parser`] - BibTeX batch splitting and per-item rendering
//! - [`tree`] - Depth-first collection walk with paginated item fetches
//! - [`output`] - HTML document rendering with `minijinja`
//!
//! The entry points [`get_collections`], [`get_bibliography`] and
//! [`get_last_modified_version`] take the [`Config`] and [`Session`]
//! explicitly; the library keeps no global state.

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod csl;
mod error;
mod http_client;
pub mod output;
pub mod parser;
pub mod session;
pub mod style;
pub mod tree;
mod user_agent;
pub mod zotero;

use std::path::Path;

use tracing::{info, instrument};

// Re-export commonly used types
pub use config::{Config, ConfigError, ConfigOverrides, LibraryType, SortField};
pub use csl::{CitationStyler, CslStyler, RenderError};
pub use error::BibgenError;
pub use output::{OutputError, render_document};
pub use parser::{BibItem, parse};
pub use session::Session;
pub use style::{FALLBACK_STYLE, StyleDefinition, StyleError, StyleResolver};
pub use tree::{CollectionNode, TreeBuilder, TreeError};
pub use zotero::{Collection, FetchError, ItemsQuery, LibraryApi, RetryPolicy, ZoteroClient};

/// Resolves the configured style and builds the collection forest.
///
/// # Errors
///
/// Returns [`BibgenError::Style`] if no usable style can be resolved and
/// [`BibgenError::Tree`] if a remote fetch fails during the walk.
#[instrument(skip_all, fields(library_id = config.library_id, style = %config.citation_style))]
pub async fn get_collections(
    config: &Config,
    session: &Session,
) -> Result<Vec<CollectionNode>, BibgenError> {
    let resolver = StyleResolver::new(&config.remote_styles_url)?;
    let style = resolver
        .resolve(&config.citation_style, &config.styles_dir)
        .await?;
    let styler = CslStyler::from_definition(&style)?;
    info!(style = styler.name(), path = %style.path.display(), "citation style ready");

    let api = session.client().await?;
    let forest = TreeBuilder::new(api, &styler)
        .with_sort(config.sort)
        .build_forest(config.top_collection.as_deref())
        .await?;

    info!(
        roots = forest.len(),
        items = forest.iter().map(CollectionNode::item_count).sum::<usize>(),
        "collection tree complete"
    );
    Ok(forest)
}

/// Builds the collection forest and renders it as an HTML document.
///
/// `template` replaces the built-in template when given.
///
/// # Errors
///
/// Returns any error of [`get_collections`], or [`BibgenError::Output`] if
/// rendering the document fails.
pub async fn get_bibliography(
    config: &Config,
    session: &Session,
    template: Option<&Path>,
) -> Result<String, BibgenError> {
    let forest = get_collections(config, session).await?;
    Ok(render_document(&forest, template)?)
}

/// Returns the library's last modified version.
///
/// # Errors
///
/// Returns [`BibgenError::Fetch`] if the request fails.
pub async fn get_last_modified_version(session: &Session) -> Result<u64, BibgenError> {
    let api = session.client().await?;
    Ok(api.last_modified_version().await?)
}
