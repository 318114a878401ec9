//! Error types for Zotero API access.
//!
//! Every variant carries the request URL so a failure deep inside the
//! collection walk still says which call went wrong.

use thiserror::Error;

/// Errors that can occur while talking to the remote library.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} fetching {url}{}", hint_for_status(.status))]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// The `Retry-After` (or Zotero `Backoff`) header value, if present.
        retry_after: Option<String>,
    },

    /// The response body could not be decoded into the expected shape.
    #[error("unexpected response from {url}: {reason}")]
    Decode {
        /// The URL whose response was malformed.
        url: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A required response header was missing or unreadable.
    #[error("response from {url} has no usable {header} header")]
    MissingHeader {
        /// The URL whose response lacked the header.
        url: String,
        /// Header name.
        header: &'static str,
    },

    /// The configured endpoint could not be turned into a request URL.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The offending URL string.
        url: String,
    },

    /// The HTTP client itself could not be constructed.
    #[error("HTTP client construction failed: {reason}")]
    ClientBuild {
        /// Why construction failed.
        reason: String,
    },
}

fn hint_for_status(status: &u16) -> &'static str {
    match *status {
        403 => "\n  Suggestion: Check the library id/type and pass --api-key for private libraries",
        404 => "\n  Suggestion: Check the library id and collection key",
        429 => "\n  Suggestion: The Zotero API is rate limiting requests; try again later",
        _ => "",
    }
}

impl FetchError {
    /// Creates a network error from a reqwest error, mapping timeouts to [`FetchError::Timeout`].
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            return Self::Timeout { url };
        }
        Self::Network { url, source }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
            retry_after: None,
        }
    }

    /// Creates an HTTP status error with a Retry-After header value.
    pub fn http_status_with_retry_after(
        url: impl Into<String>,
        status: u16,
        retry_after: Option<String>,
    ) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
            retry_after,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates a decode error.
    pub fn decode(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Decode {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a missing header error.
    pub fn missing_header(url: impl Into<String>, header: &'static str) -> Self {
        Self::MissingHeader {
            url: url.into(),
            header,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Returns the HTTP status when the failure was an error response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_timeout_display() {
        let error = FetchError::timeout("https://api.zotero.org/groups/1/collections/top");
        assert!(error.to_string().contains("timeout"));
        assert!(error.to_string().contains("/groups/1/collections/top"));
    }

    #[test]
    fn test_fetch_error_http_status_display() {
        let error = FetchError::http_status("https://api.zotero.org/users/5/items", 500);
        let msg = error.to_string();
        assert!(msg.contains("500"), "Expected '500' in: {msg}");
        assert!(msg.contains("/users/5/items"), "Expected URL in: {msg}");
        assert!(!msg.contains("Suggestion"), "500 has no hint: {msg}");
    }

    #[test]
    fn test_fetch_error_forbidden_suggests_api_key() {
        let error = FetchError::http_status("https://api.zotero.org/users/5/items", 403);
        let msg = error.to_string();
        assert!(msg.contains("403"));
        assert!(msg.contains("--api-key"), "Expected api key hint in: {msg}");
    }

    #[test]
    fn test_fetch_error_missing_header_display() {
        let error = FetchError::missing_header("https://x/items", "Last-Modified-Version");
        assert!(error.to_string().contains("Last-Modified-Version"));
    }

    #[test]
    fn test_fetch_error_status_accessor() {
        assert_eq!(FetchError::http_status("u", 404).status(), Some(404));
        assert_eq!(FetchError::timeout("u").status(), None);
    }
}
