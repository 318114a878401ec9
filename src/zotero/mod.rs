//! Access to the remote Zotero library.
//!
//! # Architecture
//!
//! - [`LibraryApi`] - Async trait with the operations the collection walk needs
//! - [`ZoteroClient`] - HTTP implementation against the Zotero Web API v3
//! - [`Collection`] - Typed collection record, validated at deserialization
//! - [`ItemsQuery`] - Pagination and sort parameters for item fetches
//! - [`RetryPolicy`] - Bounded retry for transient failures

mod client;
mod error;
mod retry;

pub use client::{DEFAULT_API_URL, ZoteroClient};
pub use error::FetchError;
pub use retry::{
    DEFAULT_MAX_ATTEMPTS, FailureType, RetryDecision, RetryPolicy, classify_error,
    parse_retry_after,
};

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::SortField;

/// A collection as reported by the remote library.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawCollection")]
pub struct Collection {
    /// Collection key (8-character identifier in Zotero).
    pub key: String,
    /// Raw collection name, including any ordering prefix.
    pub name: String,
    /// Key of the parent collection; `None` for top-level collections.
    pub parent: Option<String>,
    /// Number of direct sub-collections.
    pub num_collections: u32,
    /// Number of items directly in this collection.
    pub num_items: u32,
}

impl Collection {
    /// Creates a top-level collection with no children and no items.
    #[must_use]
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            parent: None,
            num_collections: 0,
            num_items: 0,
        }
    }

    /// Sets the parent collection key.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Sets the sub-collection and item counts.
    #[must_use]
    pub fn with_counts(mut self, num_collections: u32, num_items: u32) -> Self {
        self.num_collections = num_collections;
        self.num_items = num_items;
        self
    }

    /// Returns true when the collection has no sub-collections.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.num_collections == 0
    }
}

// Wire shape: {"key", "meta": {"numCollections", "numItems"}, "data": {"name", "parentCollection"}}
#[derive(Deserialize)]
struct RawCollection {
    key: String,
    #[serde(default)]
    meta: RawMeta,
    data: RawData,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMeta {
    #[serde(default)]
    num_collections: u32,
    #[serde(default)]
    num_items: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawData {
    name: String,
    #[serde(default)]
    parent_collection: Option<ParentRef>,
}

/// `parentCollection` is `false` for top-level collections and a key otherwise.
#[derive(Deserialize)]
#[serde(untagged)]
enum ParentRef {
    Flag(#[allow(dead_code)] bool),
    Key(String),
}

impl From<RawCollection> for Collection {
    fn from(raw: RawCollection) -> Self {
        let parent = match raw.data.parent_collection {
            Some(ParentRef::Key(key)) if !key.is_empty() => Some(key),
            _ => None,
        };
        Self {
            key: raw.key,
            name: raw.data.name,
            parent,
            num_collections: raw.meta.num_collections,
            num_items: raw.meta.num_items,
        }
    }
}

/// Pagination and ordering for one item page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemsQuery {
    /// Zero-based offset of the first item.
    pub start: u32,
    /// Maximum number of items to return.
    pub limit: u32,
    /// Optional sort field.
    pub sort: Option<SortField>,
}

/// Operations the collection walk needs from the remote library.
///
/// Uses `async_trait` so the tree builder can hold `&dyn LibraryApi` and
/// tests can substitute an in-memory library.
#[async_trait]
pub trait LibraryApi: Send + Sync {
    /// Fetches a single collection by key.
    async fn collection(&self, key: &str) -> Result<Collection, FetchError>;

    /// Lists the library's top-level collections.
    async fn top_collections(&self) -> Result<Vec<Collection>, FetchError>;

    /// Lists the sub-collections of a collection.
    async fn subcollections(&self, key: &str) -> Result<Vec<Collection>, FetchError>;

    /// Fetches one page of a collection's items as BibTeX text.
    async fn collection_items(&self, key: &str, query: ItemsQuery) -> Result<String, FetchError>;

    /// Fetches the library's last modified version.
    async fn last_modified_version(&self) -> Result<u64, FetchError>;
}
