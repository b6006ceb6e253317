//! CLI command handlers, one per pipeline stage.

mod acquire;
mod analyze;

pub use acquire::{run_crawl_command, run_listing_command};
pub use analyze::{
    run_corpus_command, run_keywords_command, run_normalize_command, run_summary_command,
};

use std::path::Path;

use anyhow::Result;
use journal_miner::analysis::{StopWordTagger, load_stop_words};
use journal_miner::config::Settings;
use journal_miner::crawl::{CrawlEngine, PageSource, RateLimiter, RetryPolicy};
use tracing::debug;

/// Builds a crawl engine over `source` from resolved settings.
pub(crate) fn build_engine<'a>(source: &'a dyn PageSource, settings: &Settings) -> CrawlEngine<'a> {
    let rate_limiter = if settings.rate_limit_ms == 0 {
        debug!("rate limiting disabled");
        RateLimiter::disabled()
    } else {
        debug!(rate_limit_ms = settings.rate_limit_ms, "rate limiting enabled");
        RateLimiter::new(settings.rate_limit())
    };
    let policy = RetryPolicy::with_max_attempts(settings.max_attempts());
    CrawlEngine::new(source, policy, rate_limiter)
}

/// Default tagger plus stop words from `override_path` or the configured file.
pub(crate) fn build_tagger(
    override_path: Option<&Path>,
    settings: &Settings,
) -> Result<StopWordTagger> {
    let tagger = StopWordTagger::new();
    let Some(path) = override_path.or(settings.stop_words_file.as_deref()) else {
        return Ok(tagger);
    };
    let words = load_stop_words(path)?;
    debug!(path = %path.display(), words = words.len(), "loaded extra stop words");
    Ok(tagger.with_stop_words(words))
}
