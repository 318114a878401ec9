//! Lazily established connection to the remote library.
//!
//! A [`Session`] is created from the validated [`Config`] and handed to
//! every operation that talks to Zotero. The underlying [`ZoteroClient`] is
//! only built on first use and then reused for the rest of the process;
//! there is no explicit teardown.

use tokio::sync::OnceCell;
use tracing::debug;

use crate::config::{Config, LibraryType};
use crate::zotero::{DEFAULT_API_URL, FetchError, RetryPolicy, ZoteroClient};

/// Shared handle to one Zotero library.
pub struct Session {
    library_id: u64,
    library_type: LibraryType,
    api_key: Option<String>,
    base_url: String,
    retry: RetryPolicy,
    client: OnceCell<ZoteroClient>,
}

impl Session {
    /// Creates a session for the library named in `config`. No connection is made yet.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            library_id: config.library_id,
            library_type: config.library_type,
            api_key: config.api_key.clone(),
            base_url: DEFAULT_API_URL.to_string(),
            retry: RetryPolicy::default(),
            client: OnceCell::new(),
        }
    }

    /// Points the session at a different API endpoint (for testing with wiremock).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Replaces the retry policy used by the client.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the client, creating it on first call.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ClientBuild`] if the HTTP client cannot be constructed.
    pub async fn client(&self) -> Result<&ZoteroClient, FetchError> {
        self.client
            .get_or_try_init(|| async {
                debug!(
                    library_id = self.library_id,
                    library_type = self.library_type.path_segment(),
                    "opening Zotero session"
                );
                ZoteroClient::with_base_url(
                    self.library_id,
                    self.library_type,
                    self.api_key.clone(),
                    self.base_url.clone(),
                )
                .map(|client| client.with_retry_policy(self.retry.clone()))
            })
            .await
    }

    /// Returns true once the client has been created.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.client.initialized()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("library_id", &self.library_id)
            .field("library_type", &self.library_type)
            .field("base_url", &self.base_url)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ConfigOverrides;

    fn config() -> Config {
        Config::from_overrides(ConfigOverrides {
            library_id: Some(99),
            library_type: Some(LibraryType::User),
            ..ConfigOverrides::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_session_client_is_created_lazily_and_reused() {
        let session = Session::new(&config()).with_base_url("http://localhost:1");
        assert!(!session.is_connected());

        let first = session.client().await.unwrap() as *const ZoteroClient;
        assert!(session.is_connected());
        let second = session.client().await.unwrap() as *const ZoteroClient;
        assert_eq!(first, second, "client must be created once and reused");
    }
}
