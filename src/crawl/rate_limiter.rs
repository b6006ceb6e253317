//! Per-host rate limiting for portal requests.
//!
//! [`RateLimiter`] enforces a minimum delay between two requests to the same
//! host and honors server deferrals (`Retry-After`). The first request to a
//! host proceeds immediately.
//!
//! ```
//! use std::time::Duration;
//! use journal_miner::crawl::RateLimiter;
//!
//! # async fn example() {
//! let limiter = RateLimiter::new(Duration::from_secs(3));
//! limiter.acquire("http://www.riss.kr/search?p=1").await;
//! // waits about three seconds
//! limiter.acquire("http://www.riss.kr/search?p=2").await;
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

/// Warning threshold for cumulative delay per host.
const CUMULATIVE_DELAY_WARNING_THRESHOLD: Duration = Duration::from_secs(300);

/// Maximum honored Retry-After value.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

/// Per-host rate limiter.
#[derive(Debug)]
pub struct RateLimiter {
    /// Minimum delay between requests to the same host.
    min_delay: Duration,

    /// Set for `--rate-limit 0`. Server deferrals are still honored.
    disabled: bool,

    /// Arc lets `acquire` drop the map shard lock before awaiting the inner mutex.
    hosts: DashMap<String, Arc<HostState>>,
}

#[derive(Debug, Default)]
struct HostTiming {
    /// `None` until the first request to the host.
    last_request: Option<Instant>,
    /// Earliest instant a server deferral allows the next request.
    deferred_until: Option<Instant>,
}

#[derive(Debug, Default)]
struct HostState {
    timing: Mutex<HostTiming>,
    cumulative_delay_ms: AtomicU64,
}

impl HostState {
    #[allow(clippy::cast_possible_truncation)]
    fn add_cumulative_delay(&self, delay: Duration) -> Duration {
        let delay_ms = delay.as_millis() as u64;
        let total = self
            .cumulative_delay_ms
            .fetch_add(delay_ms, Ordering::SeqCst)
            + delay_ms;
        Duration::from_millis(total)
    }
}

impl RateLimiter {
    /// Creates a limiter with the given minimum delay; zero disables it.
    #[must_use]
    #[instrument(skip_all, fields(delay_ms = min_delay.as_millis()))]
    pub fn new(min_delay: Duration) -> Self {
        debug!("creating rate limiter");
        Self {
            min_delay,
            disabled: min_delay.is_zero(),
            hosts: DashMap::new(),
        }
    }

    /// Creates a limiter that applies no minimum delay.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    #[must_use]
    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    fn host_state(&self, host: &str) -> Arc<HostState> {
        self.hosts
            .entry(host.to_string())
            .or_insert_with(|| Arc::new(HostState::default()))
            .clone()
    }

    /// Waits until a request to `url`'s host is allowed, then records it.
    #[instrument(skip(self), fields(host))]
    pub async fn acquire(&self, url: &str) {
        let host = extract_domain(url);
        tracing::Span::current().record("host", &host);

        let state = self.host_state(&host);
        let mut timing = state.timing.lock().await;

        let now = Instant::now();
        let spacing_ready = match timing.last_request {
            Some(last) if !self.disabled => Some(last + self.min_delay),
            _ => None,
        };
        let ready_at = match (spacing_ready, timing.deferred_until) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };

        if let Some(ready_at) = ready_at
            && ready_at > now
        {
            let delay = ready_at - now;
            let cumulative = state.add_cumulative_delay(delay);
            debug!(
                host = %host,
                delay_ms = delay.as_millis(),
                cumulative_ms = cumulative.as_millis(),
                "applying rate limit delay"
            );
            if cumulative >= CUMULATIVE_DELAY_WARNING_THRESHOLD {
                warn!(
                    host = %host,
                    cumulative_delay_secs = cumulative.as_secs(),
                    "excessive rate limiting for host"
                );
            }
            tokio::time::sleep(delay).await;
        }

        timing.last_request = Some(Instant::now());
        timing.deferred_until = None;
    }

    /// Records a server-mandated deferral for `url`'s host.
    ///
    /// The next [`acquire`](Self::acquire) for that host waits at least `delay`
    /// from now, even when the limiter is disabled.
    #[instrument(skip(self), fields(host))]
    pub async fn defer(&self, url: &str, delay: Duration) {
        let host = extract_domain(url);
        tracing::Span::current().record("host", &host);

        let state = self.host_state(&host);
        let until = Instant::now() + delay;
        let mut timing = state.timing.lock().await;
        timing.deferred_until = Some(timing.deferred_until.map_or(until, |current| current.max(until)));
        debug!(host = %host, delay_ms = delay.as_millis(), "recorded server deferral");
    }
}

/// Extracts the lowercase host from a URL, `"unknown"` when it has none.
#[must_use]
pub fn extract_domain(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Parses a Retry-After header value (integer seconds or HTTP-date).
///
/// Returns `None` if the value cannot be parsed. Values above one hour are capped.
#[must_use]
#[instrument]
pub fn parse_retry_after(header_value: &str) -> Option<Duration> {
    let header_value = header_value.trim();

    if let Ok(seconds) = header_value.parse::<i64>() {
        if seconds < 0 {
            debug!(seconds, "negative Retry-After value, ignoring");
            return None;
        }
        #[allow(clippy::cast_sign_loss)]
        let duration = Duration::from_secs(seconds as u64);
        if duration > MAX_RETRY_AFTER {
            warn!(seconds, "Retry-After exceeds maximum, capping at 1 hour");
            return Some(MAX_RETRY_AFTER);
        }
        return Some(duration);
    }

    let Ok(datetime) = httpdate::parse_http_date(header_value) else {
        debug!(header_value, "unparseable Retry-After value");
        return None;
    };
    match datetime.duration_since(std::time::SystemTime::now()) {
        Ok(duration) if duration > MAX_RETRY_AFTER => {
            warn!(
                delay_secs = duration.as_secs(),
                "Retry-After date exceeds maximum, capping at 1 hour"
            );
            Some(MAX_RETRY_AFTER)
        }
        Ok(duration) => Some(duration),
        // date in the past
        Err(_) => Some(Duration::ZERO),
    }
}
