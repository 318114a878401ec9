//! Citation style resolution.
//!
//! [`StyleResolver::resolve`] turns a style name into a CSL file on disk:
//!
//! 1. `styles_dir/<name>.csl` if it can be opened (no network access).
//! 2. Otherwise `<styles_url>/<name>` is downloaded once and cached as
//!    `styles_dir/<name>.csl`.
//! 3. If that fails, [`FALLBACK_STYLE`] is resolved the same way. There is
//!    no second fallback: if the default style cannot be found either,
//!    [`StyleError::Unresolvable`] is returned.
//!
//! A style only counts as found when it parses as an independent CSL style.
//! Anything else (a dependent style, an HTML error page) is never cached and
//! triggers the fallback like a miss.

mod error;

pub use error::StyleError;

use std::path::{Path, PathBuf};

use hayagriva::citationberg::IndependentStyle;
use reqwest::Client;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

use crate::http_client::build_http_client;
use crate::zotero::FetchError;

/// Style used when the requested style cannot be resolved.
pub const FALLBACK_STYLE: &str = "harvard1";

const STYLE_EXTENSION: &str = "csl";

/// A resolved citation style: the CSL document at `path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleDefinition {
    /// Style name as requested (or the fallback name).
    pub name: String,
    /// Location of the CSL document.
    pub path: PathBuf,
}

/// Resolves style names against a local styles directory and a remote repository.
#[derive(Debug, Clone)]
pub struct StyleResolver {
    client: Client,
    styles_url: String,
}

impl StyleResolver {
    /// Creates a resolver downloading missing styles from `styles_url`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ClientBuild`] if HTTP client construction fails.
    pub fn new(styles_url: impl Into<String>) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_http_client("styles-repository")?,
            styles_url: styles_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Resolves `name` to a CSL file in `styles_dir`, downloading it on a miss
    /// and falling back to [`FALLBACK_STYLE`] when that fails.
    ///
    /// # Errors
    ///
    /// Returns [`StyleError::Unresolvable`] when neither the requested nor the
    /// fallback style can be resolved.
    #[instrument(skip(self, styles_dir), fields(styles_dir = %styles_dir.display()))]
    pub async fn resolve(
        &self,
        name: &str,
        styles_dir: &Path,
    ) -> Result<StyleDefinition, StyleError> {
        let error = match self.resolve_one(name, styles_dir).await {
            Ok(style) => return Ok(style),
            Err(error) => error,
        };

        if name == FALLBACK_STYLE {
            return Err(unresolvable(name, error));
        }

        warn!(
            style = name,
            error = %error,
            fallback = FALLBACK_STYLE,
            "citation style unavailable; falling back to default style"
        );
        self.resolve_one(FALLBACK_STYLE, styles_dir)
            .await
            .map_err(|fallback_error| unresolvable(name, fallback_error))
    }

    async fn resolve_one(&self, name: &str, styles_dir: &Path) -> Result<StyleDefinition, StyleError> {
        validate_style_name(name)?;
        let path = style_path(styles_dir, name);

        match read_local(&path).await {
            Ok(xml) => {
                check_independent_style(&xml).map_err(|reason| StyleError::InvalidStyle {
                    path: path.clone(),
                    reason,
                })?;
                debug!(style = name, path = %path.display(), "using local citation style");
                return Ok(StyleDefinition {
                    name: name.to_string(),
                    path,
                });
            }
            Err(error) => {
                info!(
                    style = name,
                    path = %path.display(),
                    reason = %error,
                    "citation style not found locally; fetching from styles repository"
                );
            }
        }

        let body = self.download(name).await?;
        fs::create_dir_all(styles_dir)
            .await
            .map_err(|source| StyleError::io(styles_dir, source))?;
        fs::write(&path, body)
            .await
            .map_err(|source| StyleError::io(&path, source))?;
        info!(style = name, path = %path.display(), "cached downloaded citation style");

        Ok(StyleDefinition {
            name: name.to_string(),
            path,
        })
    }

    async fn download(&self, name: &str) -> Result<String, StyleError> {
        let url = format!("{}/{name}", self.styles_url);
        let to_style_error = |source: FetchError| StyleError::Download {
            style: name.to_string(),
            source,
        };

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/vnd.citationstyles.style+xml, application/xml;q=0.9, */*;q=0.1")
            .send()
            .await
            .map_err(|error| to_style_error(FetchError::network(&url, error)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(to_style_error(FetchError::http_status(&url, status.as_u16())));
        }

        let body = response
            .text()
            .await
            .map_err(|error| to_style_error(FetchError::network(&url, error)))?;
        check_independent_style(&body).map_err(|reason| StyleError::NotCsl { url, reason })?;
        Ok(body)
    }
}

fn unresolvable(style: &str, source: StyleError) -> StyleError {
    StyleError::Unresolvable {
        style: style.to_string(),
        fallback: FALLBACK_STYLE.to_string(),
        source: Box::new(source),
    }
}

async fn read_local(path: &Path) -> std::io::Result<String> {
    if !fs::metadata(path).await?.is_file() {
        return Err(std::io::Error::other("not a regular file"));
    }
    fs::read_to_string(path).await
}

/// Path of the cached CSL file for `name` inside `styles_dir`.
#[must_use]
pub fn style_path(styles_dir: &Path, name: &str) -> PathBuf {
    styles_dir.join(format!("{name}.{STYLE_EXTENSION}"))
}

fn validate_style_name(name: &str) -> Result<(), StyleError> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name.contains(['/', '\\']) {
        Some("name contains a path separator")
    } else if name.contains("..") {
        Some("name contains '..'")
    } else if name.chars().any(char::is_control) {
        Some("name contains control characters")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(StyleError::InvalidName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Dependent styles only name a parent and cannot render on their own.
fn check_independent_style(xml: &str) -> Result<(), String> {
    IndependentStyle::from_xml(xml)
        .map(drop)
        .map_err(|error| error.to_string())
}
