//! Collection tree construction.
//!
//! [`TreeBuilder`] walks the collection hierarchy depth-first in sorted
//! order. Collections with sub-collections become inner nodes; leaf
//! collections have their items fetched page by page and rendered through
//! the configured [`CitationStyler`].

use futures_util::future::{FutureExt, LocalBoxFuture};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::config::SortField;
use crate::csl::CitationStyler;
use crate::parser::{BibItem, parse};
use crate::zotero::{Collection, FetchError, ItemsQuery, LibraryApi};

/// Header level of root nodes.
pub const ROOT_HEADER_LEVEL: u32 = 2;

/// Maximum number of items requested per page.
pub const ITEM_PAGE_LIMIT: u32 = 100;

/// Errors that abort the collection walk.
#[derive(Debug, Error)]
pub enum TreeError {
    /// A listing or item page for the collection could not be fetched.
    #[error("cannot fetch collection {collection}: {source}")]
    Fetch {
        /// Key of the collection being processed.
        collection: String,
        /// The underlying fetch error.
        #[source]
        source: FetchError,
    },
}

impl TreeError {
    fn fetch(collection: &str, source: FetchError) -> Self {
        Self::Fetch {
            collection: collection.to_string(),
            source,
        }
    }
}

/// One collection in the output tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionNode {
    /// Depth-derived heading level; roots are [`ROOT_HEADER_LEVEL`].
    pub header_level: u32,
    /// Display name (ordering prefix stripped).
    pub name: String,
    /// Collection key.
    pub key: String,
    /// Child nodes in sorted order.
    pub subcollections: Vec<CollectionNode>,
    /// Items of a leaf collection in fetch order.
    pub bibitems: Vec<BibItem>,
}

impl CollectionNode {
    /// Total number of items in this node and all descendants.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.bibitems.len()
            + self
                .subcollections
                .iter()
                .map(CollectionNode::item_count)
                .sum::<usize>()
    }
}

/// Strips a leading ordering prefix (digits and spaces) from a collection name.
#[must_use]
pub fn display_name(raw_name: &str) -> &str {
    raw_name.trim_start_matches(|c: char| c.is_ascii_digit() || c == ' ')
}

/// Sorts collections by raw name, prefix included (byte order, not numeric).
pub fn sort_collections(collections: &mut [Collection]) {
    collections.sort_by(|a, b| a.name.cmp(&b.name));
}

/// Page requests `(start, limit)` needed to read `total` items.
///
/// The last page only asks for the remainder.
#[must_use]
pub fn page_bounds(total: u32, page_size: u32) -> Vec<(u32, u32)> {
    let page_size = page_size.max(1);
    let mut pages = Vec::new();
    let mut start = 0;
    while start < total {
        let limit = page_size.min(total - start);
        pages.push((start, limit));
        start += limit;
    }
    pages
}

fn direct_children(mut collections: Vec<Collection>, parent_key: &str) -> Vec<Collection> {
    collections.retain(|collection| collection.parent.as_deref() == Some(parent_key));
    collections
}

/// Builds [`CollectionNode`] trees from a [`LibraryApi`].
pub struct TreeBuilder<'a, S> {
    api: &'a dyn LibraryApi,
    styler: &'a S,
    sort: Option<SortField>,
    page_size: u32,
}

impl<'a, S: CitationStyler> TreeBuilder<'a, S> {
    /// Creates a builder with no sort field and the default page size.
    #[must_use]
    pub fn new(api: &'a dyn LibraryApi, styler: &'a S) -> Self {
        Self {
            api,
            styler,
            sort: None,
            page_size: ITEM_PAGE_LIMIT,
        }
    }

    /// Sets the sort field passed to item fetches.
    #[must_use]
    pub fn with_sort(mut self, sort: Option<SortField>) -> Self {
        self.sort = sort;
        self
    }

    /// Sets the item page size, clamped to `1..=ITEM_PAGE_LIMIT`.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, ITEM_PAGE_LIMIT);
        self
    }

    /// Builds the forest of root nodes.
    ///
    /// With `top_collection`, its direct sub-collections are the roots (or
    /// the collection itself when it has none). Otherwise the library's
    /// top-level collections are.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::Fetch`] when any listing or item page fails.
    #[instrument(skip(self))]
    pub async fn build_forest(
        &self,
        top_collection: Option<&str>,
    ) -> Result<Vec<CollectionNode>, TreeError> {
        let mut roots = match top_collection {
            Some(top_key) => {
                let top = self
                    .api
                    .collection(top_key)
                    .await
                    .map_err(|source| TreeError::fetch(top_key, source))?;
                if top.is_leaf() {
                    vec![top]
                } else {
                    let children = self
                        .api
                        .subcollections(top_key)
                        .await
                        .map_err(|source| TreeError::fetch(top_key, source))?;
                    direct_children(children, top_key)
                }
            }
            None => {
                let mut collections = self
                    .api
                    .top_collections()
                    .await
                    .map_err(|source| TreeError::fetch("<library>", source))?;
                collections.retain(|collection| collection.parent.is_none());
                collections
            }
        };
        sort_collections(&mut roots);
        info!(roots = roots.len(), "building collection tree");

        let mut forest = Vec::with_capacity(roots.len());
        for root in &roots {
            forest.push(self.build(root, ROOT_HEADER_LEVEL).await?);
        }
        Ok(forest)
    }

    /// Builds the node for `collection` at `depth`, recursing into sub-collections.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::Fetch`] when any listing or item page in the subtree fails.
    pub fn build<'b>(
        &'b self,
        collection: &'b Collection,
        depth: u32,
    ) -> LocalBoxFuture<'b, Result<CollectionNode, TreeError>> {
        async move {
            let mut node = CollectionNode {
                header_level: depth,
                name: display_name(&collection.name).to_string(),
                key: collection.key.clone(),
                subcollections: Vec::new(),
                bibitems: Vec::new(),
            };

            if collection.is_leaf() {
                node.bibitems = self.collect_items(collection).await?;
                return Ok(node);
            }

            let children = self
                .api
                .subcollections(&collection.key)
                .await
                .map_err(|source| TreeError::fetch(&collection.key, source))?;
            let mut children = direct_children(children, &collection.key);
            sort_collections(&mut children);
            debug!(collection = %collection.name, children = children.len(), "descending");

            for child in &children {
                node.subcollections.push(self.build(child, depth + 1).await?);
            }
            Ok(node)
        }
        .boxed_local()
    }

    async fn collect_items(&self, collection: &Collection) -> Result<Vec<BibItem>, TreeError> {
        let total = collection.num_items;
        let mut items = Vec::new();
        for (start, limit) in page_bounds(total, self.page_size) {
            info!("{}: {start}/{total}", collection.name);
            let query = ItemsQuery {
                start,
                limit,
                sort: self.sort,
            };
            let page = self
                .api
                .collection_items(&collection.key, query)
                .await
                .map_err(|source| TreeError::fetch(&collection.key, source))?;
            items.extend(parse(&page, self.styler));
        }
        debug!(collection = %collection.name, items = items.len(), total, "collected items");
        Ok(items)
    }
}
