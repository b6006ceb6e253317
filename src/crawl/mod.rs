//! Page acquisition: HTTP fetch, rate limiting, retry and batch crawling.
//!
//! The crawl is sequential. Every request waits on the per-host
//! [`RateLimiter`]; transient failures are retried under a [`RetryPolicy`];
//! pages that still fail are skipped and counted in a [`BatchReport`].

mod client;
mod engine;
mod error;
pub mod rate_limiter;
mod retry;

pub use client::{CONNECT_TIMEOUT_SECS, PageClient, PageSource, READ_TIMEOUT_SECS};
pub use engine::{
    BatchReport, CrawlEngine, ListingCrawl, PAGE_PLACEHOLDER, expand_listing_template,
};
pub use error::{CrawlError, FetchError};
pub use rate_limiter::{RateLimiter, extract_domain, parse_retry_after};
pub use retry::{DEFAULT_MAX_RETRIES, FailureType, RetryDecision, RetryPolicy, classify_error};
