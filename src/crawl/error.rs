//! Error types for page fetching and crawling.

use thiserror::Error;

use crate::extract::ExtractError;

/// Errors from fetching a single page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout fetching {url}")]
    Timeout { url: String },

    /// Non-success HTTP response.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        url: String,
        status: u16,
        /// Raw `Retry-After` header value, if the server sent one.
        retry_after: Option<String>,
    },

    /// The URL is malformed or not absolute.
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },
}

impl FetchError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
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

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// The URL the failed request was for.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Network { url, .. }
            | Self::Timeout { url }
            | Self::HttpStatus { url, .. }
            | Self::InvalidUrl { url } => url,
        }
    }
}

/// Errors that abort a listing crawl.
///
/// Detail-page failures never surface here; they are counted in the batch
/// report instead.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("listing page {page} could not be fetched")]
    ListingFetch {
        page: u32,
        #[source]
        source: FetchError,
    },

    #[error("listing page {page} could not be parsed")]
    ListingParse {
        page: u32,
        #[source]
        source: ExtractError,
    },

    #[error("invalid listing URL template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },
}
