//! Sequential crawl engine: listing pages and detail pages.
//!
//! The engine fetches one page at a time through a [`PageSource`], waiting on
//! the [`RateLimiter`] before every request and retrying transient failures
//! under a [`RetryPolicy`]. A detail page that cannot be fetched or extracted
//! is counted in the [`BatchReport`] and skipped; the batch always runs to
//! the end.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::rate_limiter::{RateLimiter, parse_retry_after};
use super::retry::{FailureType, RetryDecision, RetryPolicy, classify_error};
use super::{CrawlError, FetchError, PageSource};
use crate::extract::{FieldDefaults, ListingEntry, extract_article, parse_listing};
use crate::record::ArticleRecord;

/// Placeholder replaced by the page number in listing URL templates.
pub const PAGE_PLACEHOLDER: &str = "{page}";

/// Accounting for one detail-page batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub attempted: usize,
    pub extracted: usize,
    /// Pages fetched but missing their detail panel.
    pub malformed: usize,
    /// Pages that could not be fetched after retries.
    pub fetch_failed: usize,
    /// Retry attempts made across the batch.
    pub retried: usize,
    /// Unknown labels with the number of pages each appeared on.
    pub unknown_labels: BTreeMap<String, usize>,
}

impl BatchReport {
    #[must_use]
    pub fn failed(&self) -> usize {
        self.malformed + self.fetch_failed
    }
}

/// Result of a listing crawl.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingCrawl {
    pub entries: Vec<ListingEntry>,
    pub pages: usize,
    /// Entries dropped because an earlier page already listed their URL.
    pub duplicates: usize,
}

/// Expands a listing URL template over a page range.
///
/// # Errors
///
/// Returns [`CrawlError::InvalidTemplate`] if the template has no
/// [`PAGE_PLACEHOLDER`] or the range is empty.
pub fn expand_listing_template(
    template: &str,
    first: u32,
    last: u32,
) -> Result<Vec<String>, CrawlError> {
    if !template.contains(PAGE_PLACEHOLDER) {
        return Err(CrawlError::InvalidTemplate {
            template: template.to_string(),
            reason: format!("missing {PAGE_PLACEHOLDER} placeholder"),
        });
    }
    if first > last {
        return Err(CrawlError::InvalidTemplate {
            template: template.to_string(),
            reason: format!("empty page range {first}..={last}"),
        });
    }
    Ok((first..=last)
        .map(|page| template.replace(PAGE_PLACEHOLDER, &page.to_string()))
        .collect())
}

/// Sequential crawler over a [`PageSource`].
pub struct CrawlEngine<'a> {
    source: &'a dyn PageSource,
    policy: RetryPolicy,
    rate_limiter: RateLimiter,
    show_progress: bool,
}

impl std::fmt::Debug for CrawlEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrawlEngine")
            .field("policy", &self.policy)
            .field("rate_limiter", &self.rate_limiter)
            .field("show_progress", &self.show_progress)
            .finish_non_exhaustive()
    }
}

impl<'a> CrawlEngine<'a> {
    #[must_use]
    pub fn new(source: &'a dyn PageSource, policy: RetryPolicy, rate_limiter: RateLimiter) -> Self {
        Self {
            source,
            policy,
            rate_limiter,
            show_progress: false,
        }
    }

    /// Shows an indicatif progress bar during detail crawls.
    #[must_use]
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches `url`, retrying transient failures.
    ///
    /// Returns the body, or the last error with the number of attempts made.
    #[instrument(skip(self))]
    pub async fn fetch_with_retry(&self, url: &str) -> Result<(String, u32), (FetchError, u32)> {
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            debug!(attempt, "fetching page");
            self.rate_limiter.acquire(url).await;

            let error = match self.source.fetch(url).await {
                Ok(body) => return Ok((body, attempt)),
                Err(error) => error,
            };

            let failure_type = classify_error(&error);
            let retry_after = if failure_type == FailureType::RateLimited {
                retry_after_delay(&error)
            } else {
                None
            };

            match self.policy.should_retry(failure_type, attempt) {
                RetryDecision::Retry {
                    delay: backoff,
                    attempt: next_attempt,
                } => {
                    info!(
                        url,
                        attempt = next_attempt,
                        max_attempts = self.policy.max_attempts(),
                        delay_ms = retry_after.unwrap_or(backoff).as_millis(),
                        using_retry_after = retry_after.is_some(),
                        error = %error,
                        "retrying fetch"
                    );
                    match retry_after {
                        // The limiter holds the host until the deferral ends.
                        Some(delay) => self.rate_limiter.defer(url, delay).await,
                        None => tokio::time::sleep(backoff).await,
                    }
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(url, %reason, "not retrying fetch");
                    return Err((error, attempt));
                }
            }
        }
    }

    /// Fetches listing pages in order and collects their entries.
    ///
    /// Entries whose URL was already listed are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError`] for the first listing page that cannot be
    /// fetched or has no result list. No partial listing is returned.
    #[instrument(skip(self, page_urls), fields(pages = page_urls.len()))]
    pub async fn crawl_listing(&self, page_urls: &[String]) -> Result<ListingCrawl, CrawlError> {
        let mut crawl = ListingCrawl::default();
        let mut seen: HashSet<String> = HashSet::new();

        for (index, page_url) in page_urls.iter().enumerate() {
            let page = u32::try_from(index + 1).unwrap_or(u32::MAX);
            let (html, _) = self
                .fetch_with_retry(page_url)
                .await
                .map_err(|(source, _)| CrawlError::ListingFetch { page, source })?;
            let entries = parse_listing(&html, page_url)
                .map_err(|source| CrawlError::ListingParse { page, source })?;

            debug!(page, entries = entries.len(), "listing page parsed");
            crawl.pages += 1;
            for entry in entries {
                if seen.insert(entry.url.clone()) {
                    crawl.entries.push(entry);
                } else {
                    crawl.duplicates += 1;
                }
            }
        }

        info!(
            pages = crawl.pages,
            entries = crawl.entries.len(),
            duplicates = crawl.duplicates,
            "listing crawl finished"
        );
        Ok(crawl)
    }

    /// Fetches and extracts every listed article, in listing order.
    ///
    /// Failed pages are omitted from the returned records and counted in the report.
    #[instrument(skip(self, entries, defaults), fields(entries = entries.len()))]
    pub async fn crawl_articles(
        &self,
        entries: &[ListingEntry],
        defaults: &FieldDefaults,
    ) -> (Vec<ArticleRecord>, BatchReport) {
        let mut report = BatchReport::default();
        let mut records = Vec::with_capacity(entries.len());
        let progress = self.progress_bar(entries.len());

        for entry in entries {
            report.attempted += 1;
            progress.set_message(entry.title.clone());

            match self.fetch_with_retry(&entry.url).await {
                Ok((html, attempts)) => {
                    report.retried += retries(attempts);
                    match extract_article(&html, &entry.title, &entry.url, defaults) {
                        Ok(extraction) => {
                            for label in extraction.unknown_labels {
                                *report.unknown_labels.entry(label).or_default() += 1;
                            }
                            records.push(extraction.record);
                            report.extracted += 1;
                        }
                        Err(error) => {
                            warn!(url = %entry.url, error = %error, "skipping malformed page");
                            report.malformed += 1;
                        }
                    }
                }
                Err((error, attempts)) => {
                    report.retried += retries(attempts);
                    warn!(url = %entry.url, attempts, error = %error, "skipping unfetchable page");
                    report.fetch_failed += 1;
                }
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        info!(
            attempted = report.attempted,
            extracted = report.extracted,
            malformed = report.malformed,
            fetch_failed = report.fetch_failed,
            retried = report.retried,
            unknown_labels = report.unknown_labels.len(),
            "article crawl finished"
        );
        (records, report)
    }

    fn progress_bar(&self, total: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(u64::try_from(total).unwrap_or(u64::MAX));
        bar.set_style(
            ProgressStyle::with_template("{bar:30} {pos}/{len} {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        bar
    }
}

fn retries(attempts: u32) -> usize {
    usize::try_from(attempts.saturating_sub(1)).unwrap_or(usize::MAX)
}

fn retry_after_delay(error: &FetchError) -> Option<Duration> {
    let FetchError::HttpStatus {
        retry_after: Some(header),
        ..
    } = error
    else {
        return None;
    };
    let delay = parse_retry_after(header)?;
    debug!(retry_after = %header, delay_ms = delay.as_millis(), "using Retry-After delay");
    Some(delay)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    /// Serves queued responses per URL; the last response repeats.
    #[derive(Default)]
    struct ScriptedSource {
        responses: Mutex<HashMap<String, Vec<Result<String, u16>>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedSource {
        fn with(self, url: &str, responses: Vec<Result<String, u16>>) -> Self {
            self.responses
                .lock()
                .unwrap()
                .insert(url.to_string(), responses);
            self
        }

        fn calls(&self, url: &str) -> usize {
            self.calls.lock().unwrap().iter().filter(|c| *c == url).count()
        }
    }

    #[async_trait]
    impl PageSource for ScriptedSource {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.calls.lock().unwrap().push(url.to_string());
            let mut responses = self.responses.lock().unwrap();
            let queue = responses
                .get_mut(url)
                .ok_or_else(|| FetchError::http_status(url, 404))?;
            let response = if queue.len() > 1 {
                queue.remove(0)
            } else {
                queue[0].clone()
            };
            response.map_err(|status| FetchError::http_status(url, status))
        }
    }

    fn detail_page(author: &str) -> String {
        format!(
            r#"<div class="infoDetailL"><ul><li><span class="strong">저자</span><div>{author}</div></li></ul></div>"#
        )
    }

    fn engine(source: &ScriptedSource) -> CrawlEngine<'_> {
        CrawlEngine::new(
            source,
            RetryPolicy::with_max_attempts(3).without_jitter(),
            RateLimiter::disabled(),
        )
    }

    #[tokio::test]
    async fn test_transient_failure_retried_then_succeeds() {
        tokio::time::pause();
        let source = ScriptedSource::default().with(
            "http://p/1",
            vec![Err(503), Ok(detail_page("홍길동"))],
        );

        let (body, attempts) = engine(&source).fetch_with_retry("http://p/1").await.unwrap();
        assert_eq!(attempts, 2);
        assert!(body.contains("홍길동"));
    }

    #[tokio::test]
    async fn test_permanent_failure_not_retried() {
        tokio::time::pause();
        let source = ScriptedSource::default().with("http://p/1", vec![Err(404)]);

        let (error, attempts) = engine(&source).fetch_with_retry("http://p/1").await.unwrap_err();
        assert_eq!(attempts, 1);
        assert_eq!(source.calls("http://p/1"), 1);
        assert!(matches!(error, FetchError::HttpStatus { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        tokio::time::pause();
        let source = ScriptedSource::default().with("http://p/1", vec![Err(500)]);

        let (_, attempts) = engine(&source).fetch_with_retry("http://p/1").await.unwrap_err();
        assert_eq!(attempts, 3);
        assert_eq!(source.calls("http://p/1"), 3);
    }

    #[tokio::test]
    async fn test_batch_skips_malformed_and_counts() {
        tokio::time::pause();
        let mut source = ScriptedSource::default();
        let mut entries = Vec::new();
        for index in 0..10 {
            let url = format!("http://p/{index}");
            let page = if index == 4 {
                "<html><body>blocked</body></html>".to_string()
            } else {
                detail_page(&format!("author {index}"))
            };
            source = source.with(&url, vec![Ok(page)]);
            entries.push(ListingEntry::new(format!("title {index}"), url));
        }

        let (records, report) = engine(&source)
            .crawl_articles(&entries, &FieldDefaults::default())
            .await;

        assert_eq!(records.len(), 9);
        assert_eq!(report.attempted, 10);
        assert_eq!(report.extracted, 9);
        assert_eq!(report.malformed, 1);
        assert_eq!(report.failed(), 1);
        assert!(records.iter().all(|r| r.url != "http://p/4"));
    }

    #[tokio::test]
    async fn test_batch_counts_fetch_failures_and_unknown_labels() {
        tokio::time::pause();
        let page = r#"<div class="infoDetailL"><ul>
            <li><span class="strong">DOI</span><div>10.1/x</div></li></ul></div>"#;
        let source = ScriptedSource::default()
            .with("http://p/a", vec![Ok(page.to_string())])
            .with("http://p/b", vec![Ok(page.to_string())])
            .with("http://p/c", vec![Err(403)]);
        let entries = vec![
            ListingEntry::new("a", "http://p/a"),
            ListingEntry::new("b", "http://p/b"),
            ListingEntry::new("c", "http://p/c"),
        ];

        let (records, report) = engine(&source)
            .crawl_articles(&entries, &FieldDefaults::default())
            .await;

        assert_eq!(records.len(), 2);
        assert_eq!(report.fetch_failed, 1);
        assert_eq!(report.unknown_labels.get("DOI"), Some(&2));
    }

    #[tokio::test]
    async fn test_listing_crawl_dedupes_and_resolves() {
        tokio::time::pause();
        let listing = |hrefs: &[&str]| {
            let items: String = hrefs
                .iter()
                .map(|href| {
                    format!(r#"<li><div class="cont"><p class="title"><a href="{href}">{href}</a></p></div></li>"#)
                })
                .collect();
            format!(r#"<div class="srchResultListW"><ul>{items}</ul></div>"#)
        };
        let source = ScriptedSource::default()
            .with("http://p/list?page=1", vec![Ok(listing(&["/a", "/b"]))])
            .with("http://p/list?page=2", vec![Ok(listing(&["/b", "/c"]))]);
        let pages = expand_listing_template("http://p/list?page={page}", 1, 2).unwrap();

        let crawl = engine(&source).crawl_listing(&pages).await.unwrap();

        let urls: Vec<_> = crawl.entries.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(urls, vec!["http://p/a", "http://p/b", "http://p/c"]);
        assert_eq!(crawl.pages, 2);
        assert_eq!(crawl.duplicates, 1);
    }

    #[tokio::test]
    async fn test_listing_page_without_results_aborts() {
        tokio::time::pause();
        let source =
            ScriptedSource::default().with("http://p/list", vec![Ok("<html></html>".to_string())]);
        let result = engine(&source)
            .crawl_listing(&["http://p/list".to_string()])
            .await;
        assert!(matches!(result, Err(CrawlError::ListingParse { page: 1, .. })));
    }

    #[test]
    fn test_expand_listing_template() {
        assert_eq!(
            expand_listing_template("http://x/?p={page}", 2, 3).unwrap(),
            vec!["http://x/?p=2", "http://x/?p=3"]
        );
        assert!(expand_listing_template("http://x/", 1, 2).is_err());
        assert!(expand_listing_template("http://x/{page}", 3, 2).is_err());
    }
}
