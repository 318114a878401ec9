//! HTTP implementation of [`LibraryApi`] against the Zotero Web API v3.

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::LibraryType;
use crate::http_client::build_http_client;

use super::retry::{RetryDecision, RetryPolicy};
use super::{Collection, FetchError, ItemsQuery, LibraryApi};

/// Default Zotero API base URL.
pub const DEFAULT_API_URL: &str = "https://api.zotero.org";

/// Zotero caps list responses at 100 entries per request.
const LIST_LIMIT: u32 = 100;

const API_VERSION: &str = "3";
const TOTAL_RESULTS: &str = "Total-Results";
const LAST_MODIFIED_VERSION: &str = "Last-Modified-Version";
const BACKOFF: &str = "Backoff";

/// Client for one Zotero library (user or group).
///
/// Created once per process and reused; cloning shares the connection pool.
#[derive(Clone)]
pub struct ZoteroClient {
    client: Client,
    base_url: String,
    prefix: String,
    api_key: Option<String>,
    retry: RetryPolicy,
}

impl ZoteroClient {
    /// Creates a client for the given library using the public API endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ClientBuild`] if HTTP client construction fails.
    pub fn new(
        library_id: u64,
        library_type: LibraryType,
        api_key: Option<String>,
    ) -> Result<Self, FetchError> {
        Self::with_base_url(library_id, library_type, api_key, DEFAULT_API_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ClientBuild`] if HTTP client construction fails.
    pub fn with_base_url(
        library_id: u64,
        library_type: LibraryType,
        api_key: Option<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, FetchError> {
        let client = build_http_client("zotero-api")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            prefix: format!("{}/{library_id}", library_type.path_segment()),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            retry: RetryPolicy::default(),
        })
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url, FetchError> {
        let raw = format!("{}/{}/{}", self.base_url, self.prefix, path);
        let mut url = Url::parse(&raw).map_err(|_| FetchError::invalid_url(&raw))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
        }
        Ok(url)
    }

    async fn send(&self, url: &Url) -> Result<Response, FetchError> {
        let mut attempt = 1;
        loop {
            match self.send_once(url).await {
                Ok(response) => return Ok(response),
                Err(error) => match self.retry.should_retry(&error, attempt) {
                    RetryDecision::Retry {
                        delay,
                        attempt: next,
                    } => {
                        warn!(
                            url = %url,
                            error = %error,
                            attempt,
                            delay_ms = delay.as_millis(),
                            "Zotero request failed; retrying"
                        );
                        tokio::time::sleep(delay).await;
                        attempt = next;
                    }
                    RetryDecision::DoNotRetry { reason } => {
                        debug!(url = %url, %reason, "giving up on request");
                        return Err(error);
                    }
                },
            }
        }
    }

    async fn send_once(&self, url: &Url) -> Result<Response, FetchError> {
        debug!(url = %url, "GET");
        let mut request = self
            .client
            .get(url.clone())
            .header("Zotero-API-Version", API_VERSION);
        if let Some(api_key) = &self.api_key {
            request = request.header("Zotero-API-Key", api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|error| FetchError::network(url.as_str(), error))?;

        if let Some(backoff) = header_value(&response, BACKOFF) {
            warn!(url = %url, backoff_secs = %backoff, "Zotero API asked clients to back off");
        }

        let status = response.status();
        if !status.is_success() {
            let retry_after = header_value(&response, RETRY_AFTER.as_str())
                .or_else(|| header_value(&response, BACKOFF));
            return Err(FetchError::http_status_with_retry_after(
                url.as_str(),
                status.as_u16(),
                retry_after,
            ));
        }
        Ok(response)
    }

    async fn read_text(url: &Url, response: Response) -> Result<String, FetchError> {
        response
            .text()
            .await
            .map_err(|error| FetchError::network(url.as_str(), error))
    }

    async fn read_json<T: DeserializeOwned>(url: &Url, response: Response) -> Result<T, FetchError> {
        let body = Self::read_text(url, response).await?;
        serde_json::from_str(&body).map_err(|error| FetchError::decode(url.as_str(), error))
    }

    /// Reads every page of a collection listing, following `Total-Results`.
    async fn list_collections(&self, path: &str) -> Result<Vec<Collection>, FetchError> {
        let mut collections = Vec::new();
        let mut start: u32 = 0;
        loop {
            let url = self.endpoint(
                path,
                &[("limit", LIST_LIMIT.to_string()), ("start", start.to_string())],
            )?;
            let response = self.send(&url).await?;
            let total = header_value(&response, TOTAL_RESULTS).and_then(|v| v.parse::<u32>().ok());
            let page: Vec<Collection> = Self::read_json(&url, response).await?;
            let received = u32::try_from(page.len()).unwrap_or(u32::MAX);
            collections.extend(page);
            start = start.saturating_add(received);

            match total {
                Some(total) if start < total && received > 0 => {
                    debug!(path, start, total, "fetching next collection page");
                }
                _ => break,
            }
        }
        Ok(collections)
    }
}

impl std::fmt::Debug for ZoteroClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZoteroClient")
            .field("base_url", &self.base_url)
            .field("prefix", &self.prefix)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

fn header_value(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[async_trait]
impl LibraryApi for ZoteroClient {
    #[instrument(skip(self), fields(library = %self.prefix))]
    async fn collection(&self, key: &str) -> Result<Collection, FetchError> {
        let url = self.endpoint(&format!("collections/{key}"), &[])?;
        let response = self.send(&url).await?;
        Self::read_json(&url, response).await
    }

    #[instrument(skip(self), fields(library = %self.prefix))]
    async fn top_collections(&self) -> Result<Vec<Collection>, FetchError> {
        self.list_collections("collections/top").await
    }

    #[instrument(skip(self), fields(library = %self.prefix))]
    async fn subcollections(&self, key: &str) -> Result<Vec<Collection>, FetchError> {
        self.list_collections(&format!("collections/{key}/collections"))
            .await
    }

    #[instrument(skip(self), fields(library = %self.prefix))]
    async fn collection_items(&self, key: &str, query: ItemsQuery) -> Result<String, FetchError> {
        let mut params = vec![
            ("format", "bibtex".to_string()),
            ("start", query.start.to_string()),
            ("limit", query.limit.to_string()),
        ];
        if let Some(sort) = query.sort {
            params.push(("sort", sort.as_str().to_string()));
        }
        let url = self.endpoint(&format!("collections/{key}/items"), &params)?;
        let response = self.send(&url).await?;
        Self::read_text(&url, response).await
    }

    #[instrument(skip(self), fields(library = %self.prefix))]
    async fn last_modified_version(&self) -> Result<u64, FetchError> {
        let url = self.endpoint("items", &[("limit", "1".to_string())])?;
        let response = self.send(&url).await?;
        header_value(&response, LAST_MODIFIED_VERSION)
            .and_then(|value| value.parse::<u64>().ok())
            .ok_or_else(|| FetchError::missing_header(url.as_str(), LAST_MODIFIED_VERSION))
    }
}
