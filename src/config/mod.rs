//! Configuration: defaults, overrides and validation.
//!
//! Configuration is layered: built-in defaults, then the TOML settings file,
//! then command-line flags. Each layer is a [`ConfigOverrides`] in which
//! absent fields leave the lower layer untouched; [`Config::from_overrides`]
//! applies the result to the defaults and validates the required fields.

mod error;
mod file;

pub use error::ConfigError;
pub use file::{default_settings_path, load_settings_file};

use std::path::PathBuf;

use serde::Deserialize;

/// Citation style used when none is configured.
pub const DEFAULT_CITATION_STYLE: &str = "theologie-und-philosophie";

/// Directory searched for `<style>.csl` files when none is configured.
pub const DEFAULT_STYLES_DIR: &str = "citation_styles";

/// Remote repository styles are downloaded from on a cache miss.
pub const DEFAULT_STYLES_URL: &str = "https://www.zotero.org/styles";

/// Kind of Zotero library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LibraryType {
    /// A personal library (`/users/<id>`).
    User,
    /// A group library (`/groups/<id>`).
    Group,
}

impl LibraryType {
    /// API path segment for this library type.
    #[must_use]
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::User => "users",
            Self::Group => "groups",
        }
    }
}

/// Fields the Zotero API can sort items by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[value(name = "dateAdded")]
    DateAdded,
    #[value(name = "dateModified")]
    DateModified,
    #[value(name = "title")]
    Title,
    #[value(name = "creator")]
    Creator,
    #[value(name = "type")]
    Type,
    #[value(name = "date")]
    Date,
    #[value(name = "publisher")]
    Publisher,
    #[value(name = "publicationTitle")]
    PublicationTitle,
    #[value(name = "journalAbbreviation")]
    JournalAbbreviation,
    #[value(name = "language")]
    Language,
    #[value(name = "accessDate")]
    AccessDate,
    #[value(name = "libraryCatalog")]
    LibraryCatalog,
    #[value(name = "callNumber")]
    CallNumber,
    #[value(name = "rights")]
    Rights,
    #[value(name = "addedBy")]
    AddedBy,
    #[value(name = "numItems")]
    NumItems,
}

impl SortField {
    /// Name of the field as the Zotero API expects it.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DateAdded => "dateAdded",
            Self::DateModified => "dateModified",
            Self::Title => "title",
            Self::Creator => "creator",
            Self::Type => "type",
            Self::Date => "date",
            Self::Publisher => "publisher",
            Self::PublicationTitle => "publicationTitle",
            Self::JournalAbbreviation => "journalAbbreviation",
            Self::Language => "language",
            Self::AccessDate => "accessDate",
            Self::LibraryCatalog => "libraryCatalog",
            Self::CallNumber => "callNumber",
            Self::Rights => "rights",
            Self::AddedBy => "addedBy",
            Self::NumItems => "numItems",
        }
    }
}

/// Partial configuration: one layer of settings.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    pub library_id: Option<u64>,
    pub library_type: Option<LibraryType>,
    pub api_key: Option<String>,
    pub sort: Option<SortField>,
    pub top_collection: Option<String>,
    pub citation_style: Option<String>,
    pub styles_dir: Option<PathBuf>,
    pub remote_styles_url: Option<String>,
}

impl ConfigOverrides {
    /// Layers `overrides` on top of `self`: every field present in
    /// `overrides` wins, absent fields keep the value from `self`.
    #[must_use]
    pub fn merge(self, overrides: ConfigOverrides) -> ConfigOverrides {
        ConfigOverrides {
            library_id: overrides.library_id.or(self.library_id),
            library_type: overrides.library_type.or(self.library_type),
            api_key: overrides.api_key.or(self.api_key),
            sort: overrides.sort.or(self.sort),
            top_collection: overrides.top_collection.or(self.top_collection),
            citation_style: overrides.citation_style.or(self.citation_style),
            styles_dir: overrides.styles_dir.or(self.styles_dir),
            remote_styles_url: overrides.remote_styles_url.or(self.remote_styles_url),
        }
    }
}

impl std::fmt::Debug for ConfigOverrides {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigOverrides")
            .field("library_id", &self.library_id)
            .field("library_type", &self.library_type)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("sort", &self.sort)
            .field("top_collection", &self.top_collection)
            .field("citation_style", &self.citation_style)
            .field("styles_dir", &self.styles_dir)
            .field("remote_styles_url", &self.remote_styles_url)
            .finish()
    }
}

/// Fully resolved, validated configuration. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub library_id: u64,
    pub library_type: LibraryType,
    pub api_key: Option<String>,
    pub sort: Option<SortField>,
    pub top_collection: Option<String>,
    pub citation_style: String,
    pub styles_dir: PathBuf,
    pub remote_styles_url: String,
}

impl Config {
    /// Applies `overrides` to the built-in defaults and validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when the library id or type is
    /// absent, and [`ConfigError::InvalidValue`] for blank style names or URLs.
    pub fn from_overrides(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let library_id = overrides
            .library_id
            .ok_or_else(|| ConfigError::missing("library_id", "--library-id"))?;
        let library_type = overrides
            .library_type
            .ok_or_else(|| ConfigError::missing("library_type", "--library-type"))?;

        let citation_style = overrides
            .citation_style
            .map(|style| style.trim().to_string())
            .unwrap_or_else(|| DEFAULT_CITATION_STYLE.to_string());
        if citation_style.is_empty() {
            return Err(ConfigError::invalid("citation_style", "must not be empty"));
        }

        let remote_styles_url = overrides
            .remote_styles_url
            .unwrap_or_else(|| DEFAULT_STYLES_URL.to_string());
        if url::Url::parse(&remote_styles_url).is_err() {
            return Err(ConfigError::invalid(
                "remote_styles_url",
                format!("`{remote_styles_url}` is not an absolute URL"),
            ));
        }

        Ok(Self {
            library_id,
            library_type,
            api_key: non_blank(overrides.api_key),
            sort: overrides.sort,
            top_collection: non_blank(overrides.top_collection),
            citation_style,
            styles_dir: overrides
                .styles_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STYLES_DIR)),
            remote_styles_url,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("library_id", &self.library_id)
            .field("library_type", &self.library_type)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("sort", &self.sort)
            .field("top_collection", &self.top_collection)
            .field("citation_style", &self.citation_style)
            .field("styles_dir", &self.styles_dir)
            .field("remote_styles_url", &self.remote_styles_url)
            .finish()
    }
}
