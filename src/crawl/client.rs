//! HTTP page client and the [`PageSource`] seam.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::RETRY_AFTER;
use tracing::{debug, instrument};
use url::Url;

use super::FetchError;
use crate::user_agent;

/// Connect timeout in seconds.
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Whole-request timeout in seconds. Detail pages are small.
pub const READ_TIMEOUT_SECS: u64 = 60;

/// Source of page HTML.
///
/// `async_trait` keeps the trait object-safe so the crawl engine can hold a
/// `&dyn PageSource`, and tests can substitute canned pages.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches the body of `url` as text.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// reqwest-backed [`PageSource`].
#[derive(Debug, Clone)]
pub struct PageClient {
    client: Client,
}

impl PageClient {
    /// Creates a client with default timeouts.
    ///
    /// # Errors
    /// Returns the reqwest error if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a client with explicit timeouts in seconds.
    ///
    /// # Errors
    /// Returns the reqwest error if the TLS backend cannot be initialized.
    pub fn with_timeouts(
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .user_agent(user_agent::default_crawl_user_agent())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageSource for PageClient {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::timeout(url)
            } else {
                FetchError::network(url, e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string);
            return Err(FetchError::http_status_with_retry_after(
                url,
                status.as_u16(),
                retry_after,
            ));
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::timeout(url)
            } else {
                FetchError::network(url, e)
            }
        })?;
        debug!(bytes = body.len(), "fetched page");
        Ok(body)
    }
}
