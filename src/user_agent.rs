//! User-Agent string for portal requests.

/// Project URL for User-Agent identification (RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/fierce/journal-miner";

/// Default User-Agent for crawl requests (identifies the tool).
#[must_use]
pub(crate) fn default_crawl_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("journal-miner/{version} (academic-research-tool; +{PROJECT_UA_URL})")
}
