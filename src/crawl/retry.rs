//! Bounded retry with exponential backoff for transient fetch failures.
//!
//! A failed fetch is classified into a [`FailureType`]; [`RetryPolicy`] then
//! decides whether another attempt is made and how long to wait first.
//!
//! ```
//! use journal_miner::crawl::{FetchError, RetryDecision, RetryPolicy, classify_error};
//!
//! let policy = RetryPolicy::default();
//! let error = FetchError::http_status("http://www.riss.kr/a", 503);
//!
//! match policy.should_retry(classify_error(&error), 1) {
//!     RetryDecision::Retry { delay, attempt } => println!("retry #{attempt} in {delay:?}"),
//!     RetryDecision::DoNotRetry { reason } => println!("giving up: {reason}"),
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use tracing::{debug, instrument};

use super::FetchError;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(32);
const DEFAULT_BACKOFF_MULTIPLIER: f32 = 2.0;
const DEFAULT_MAX_JITTER: Duration = Duration::from_millis(500);

/// Classification of fetch failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Timeouts, connection errors, 408 and 5xx.
    Transient,
    /// 404, 400, bad URLs, TLS problems.
    Permanent,
    /// HTTP 429. Retried; a `Retry-After` value takes precedence over backoff.
    RateLimited,
    /// HTTP 401 and 403. The portal answers this way when it blocks a client.
    Blocked,
}

/// Whether and when to retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    Retry {
        delay: Duration,
        /// Number of the attempt about to be made (first retry is 2).
        attempt: u32,
    },
    DoNotRetry {
        reason: String,
    },
}

/// Retry configuration.
///
/// Delay before attempt `n + 1` is
/// `min(base_delay * multiplier^(n - 1), max_delay) + jitter`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    backoff_multiplier: f32,
    max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RETRIES + 1,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            max_jitter: DEFAULT_MAX_JITTER,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy. `max_attempts` is raised to at least 1.
    #[must_use]
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
        backoff_multiplier: f32,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            backoff_multiplier,
            max_jitter: DEFAULT_MAX_JITTER,
        }
    }

    /// Default policy with a custom attempt count.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Same policy with deterministic delays.
    #[must_use]
    pub fn without_jitter(mut self) -> Self {
        self.max_jitter = Duration::ZERO;
        self
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decides what to do after `attempt` (1-indexed) failed with `failure_type`.
    #[instrument(skip(self), fields(max_attempts = self.max_attempts))]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        match failure_type {
            FailureType::Permanent => {
                return RetryDecision::DoNotRetry {
                    reason: "permanent failure".to_string(),
                };
            }
            FailureType::Blocked => {
                return RetryDecision::DoNotRetry {
                    reason: "access blocked by server".to_string(),
                };
            }
            FailureType::Transient | FailureType::RateLimited => {}
        }

        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        let delay = self.calculate_delay(attempt);
        debug!(
            attempt,
            next_attempt = attempt + 1,
            delay_ms = delay.as_millis(),
            "will retry"
        );
        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as f64;
        let exponent = f64::from(attempt.saturating_sub(1));
        let delay_ms = base_ms * f64::from(self.backoff_multiplier).powf(exponent);
        let capped_ms = delay_ms.min(self.max_delay.as_millis() as f64);

        Duration::from_millis(capped_ms as u64) + self.calculate_jitter()
    }

    #[allow(clippy::cast_possible_truncation)]
    fn calculate_jitter(&self) -> Duration {
        if self.max_jitter.is_zero() {
            return Duration::ZERO;
        }
        let jitter_ms = rand::thread_rng().gen_range(0..=self.max_jitter.as_millis() as u64);
        Duration::from_millis(jitter_ms)
    }
}

/// Classifies a fetch error for retry decisions.
#[instrument]
pub fn classify_error(error: &FetchError) -> FailureType {
    match error {
        FetchError::HttpStatus { status, .. } => classify_http_status(*status),
        FetchError::Timeout { .. } => FailureType::Transient,
        FetchError::Network { source, .. } => {
            if is_tls_error(source) {
                FailureType::Permanent
            } else {
                FailureType::Transient
            }
        }
        FetchError::InvalidUrl { .. } => FailureType::Permanent,
    }
}

#[allow(clippy::match_same_arms)]
fn classify_http_status(status: u16) -> FailureType {
    match status {
        401 | 403 => FailureType::Blocked,
        408 => FailureType::Transient,
        429 => FailureType::RateLimited,
        status if (400..500).contains(&status) => FailureType::Permanent,
        status if (500..600).contains(&status) => FailureType::Transient,
        _ => FailureType::Permanent,
    }
}

fn is_tls_error(error: &reqwest::Error) -> bool {
    let message = error.to_string().to_lowercase();
    message.contains("certificate")
        || message.contains("tls")
        || message.contains("ssl")
        || message.contains("handshake")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 4);
        assert_eq!(policy.max_attempts(), DEFAULT_MAX_RETRIES + 1);
        assert_eq!(policy.base_delay, Duration::from_secs(1));
        assert_eq!(policy.max_delay, Duration::from_secs(32));
    }

    #[test]
    fn test_max_attempts_minimum_is_one() {
        assert_eq!(RetryPolicy::with_max_attempts(0).max_attempts(), 1);
    }

    #[test]
    fn test_delay_doubles_without_jitter() {
        let policy = RetryPolicy::new(10, Duration::from_secs(1), Duration::from_secs(32), 2.0)
            .without_jitter();
        assert_eq!(policy.calculate_delay(1), Duration::from_secs(1));
        assert_eq!(policy.calculate_delay(2), Duration::from_secs(2));
        assert_eq!(policy.calculate_delay(3), Duration::from_secs(4));
    }

    #[test]
    fn test_delay_capped_at_max() {
        let policy = RetryPolicy::new(20, Duration::from_secs(1), Duration::from_secs(32), 2.0)
            .without_jitter();
        assert_eq!(policy.calculate_delay(10), Duration::from_secs(32));
    }

    #[test]
    fn test_jitter_bounded() {
        let policy = RetryPolicy::default();
        for _ in 0..20 {
            let delay = policy.calculate_delay(1);
            assert!(delay >= Duration::from_secs(1));
            assert!(delay <= Duration::from_millis(1500));
        }
    }

    #[test]
    fn test_permanent_never_retried() {
        let policy = RetryPolicy::with_max_attempts(10);
        for attempt in 1..10 {
            assert!(matches!(
                policy.should_retry(FailureType::Permanent, attempt),
                RetryDecision::DoNotRetry { .. }
            ));
        }
    }

    #[test]
    fn test_blocked_not_retried() {
        let decision = RetryPolicy::default().should_retry(FailureType::Blocked, 1);
        assert!(matches!(decision, RetryDecision::DoNotRetry { reason } if reason.contains("blocked")));
    }

    #[test]
    fn test_transient_retried_until_exhausted() {
        let policy = RetryPolicy::with_max_attempts(3).without_jitter();
        assert_eq!(
            policy.should_retry(FailureType::Transient, 1),
            RetryDecision::Retry {
                delay: Duration::from_secs(1),
                attempt: 2
            }
        );
        assert!(matches!(
            policy.should_retry(FailureType::RateLimited, 2),
            RetryDecision::Retry { attempt: 3, .. }
        ));
        assert!(matches!(
            policy.should_retry(FailureType::Transient, 3),
            RetryDecision::DoNotRetry { .. }
        ));
    }

    #[test]
    fn test_classify_http_status() {
        assert_eq!(classify_http_status(404), FailureType::Permanent);
        assert_eq!(classify_http_status(400), FailureType::Permanent);
        assert_eq!(classify_http_status(403), FailureType::Blocked);
        assert_eq!(classify_http_status(401), FailureType::Blocked);
        assert_eq!(classify_http_status(408), FailureType::Transient);
        assert_eq!(classify_http_status(429), FailureType::RateLimited);
        assert_eq!(classify_http_status(500), FailureType::Transient);
        assert_eq!(classify_http_status(503), FailureType::Transient);
        assert_eq!(classify_http_status(302), FailureType::Permanent);
    }

    #[test]
    fn test_classify_error_variants() {
        assert_eq!(
            classify_error(&FetchError::timeout("http://x")),
            FailureType::Transient
        );
        assert_eq!(
            classify_error(&FetchError::invalid_url("x")),
            FailureType::Permanent
        );
        assert_eq!(
            classify_error(&FetchError::http_status("http://x", 502)),
            FailureType::Transient
        );
    }
}
