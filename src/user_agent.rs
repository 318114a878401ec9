//! Shared User-Agent string for API and styles-repository traffic.

/// Project URL for User-Agent identification (good citizenship; RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/cceh/zotero-bibgen";

/// Default User-Agent for every HTTP request the tool makes.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("zotero-bibgen/{version} (bibliography-generator; +{PROJECT_UA_URL})")
}
