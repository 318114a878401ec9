//! HTML document rendering.
//!
//! The collection forest is handed to a `minijinja` template as
//! `collections`. Each node exposes `header_level`, `name`, `key`,
//! `subcollections` and `bibitems`; each item exposes `key`, `raw_record`
//! and `rendered` (an HTML fragment or none). Templates are auto-escaped,
//! so rendered citations must be emitted with `|safe`.

use std::path::{Path, PathBuf};

use minijinja::{Environment, context};
use thiserror::Error;
use tracing::debug;

use crate::tree::CollectionNode;

/// Template used when no custom template is given.
pub const DEFAULT_TEMPLATE: &str = include_str!("../../templates/bibliography.html");

// The `.html` suffix turns on HTML auto-escaping.
const TEMPLATE_NAME: &str = "bibliography.html";

/// Errors that can occur while producing the output document.
#[derive(Debug, Error)]
pub enum OutputError {
    /// The template file could not be read.
    #[error("cannot read template {path}: {source}")]
    Read {
        /// The template path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The template failed to compile or render.
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    /// The document could not be written.
    #[error("cannot write document to {path}: {source}")]
    Write {
        /// The output path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Renders the forest into an HTML document, using the template at
/// `template` or [`DEFAULT_TEMPLATE`].
///
/// # Errors
///
/// Returns [`OutputError`] when the template cannot be read, compiled or rendered.
pub fn render_document(
    forest: &[CollectionNode],
    template: Option<&Path>,
) -> Result<String, OutputError> {
    match template {
        Some(path) => {
            let source = std::fs::read_to_string(path).map_err(|source| OutputError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            debug!(template = %path.display(), "using custom template");
            render_with(&source, forest)
        }
        None => render_with(DEFAULT_TEMPLATE, forest),
    }
}

fn render_with(source: &str, forest: &[CollectionNode]) -> Result<String, OutputError> {
    let mut env = Environment::new();
    env.add_template(TEMPLATE_NAME, source)?;
    let template = env.get_template(TEMPLATE_NAME)?;
    Ok(template.render(context! { collections => forest })?)
}
