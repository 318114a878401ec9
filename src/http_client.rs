//! Shared HTTP client construction policy.
//!
//! Both the Zotero API client and the style downloader build their
//! `reqwest::Client` here so timeouts, compression and User-Agent stay
//! consistent.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::user_agent;
use crate::zotero::FetchError;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const READ_TIMEOUT_SECS: u64 = 60;

/// Builds an HTTP client using the shared project policy.
///
/// `purpose` is only used for logging.
///
/// # Errors
///
/// Returns [`FetchError::ClientBuild`] when client construction fails.
pub fn build_http_client(purpose: &str) -> Result<Client, FetchError> {
    debug!(purpose, "building HTTP client");
    Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
        .user_agent(user_agent::default_user_agent())
        .gzip(true)
        .build()
        .map_err(|error| FetchError::ClientBuild {
            reason: format!("{purpose}: {error}"),
        })
}
