//! Exponential backoff for sitemap fetches.
//!
//! The delay before retry `n` (zero-based) is `min_delay * 2^n`, capped at
//! `max_delay`, then spread by up to ±25% jitter. A `Retry-After` sent by the
//! origin acts as a floor so the client never comes back sooner than asked.
//!
//! | Retry | Base delay (defaults) |
//! |-------|-----------------------|
//! | 0     | 1 s                   |
//! | 1     | 2 s                   |
//! | 2     | 4 s                   |

use std::time::Duration;

use rand::Rng;

use crate::Error;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay before the first retry.
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_secs(1);

/// Default upper bound for a single backoff delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// How often, and how patiently, a failed fetch is repeated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Base delay before the first retry.
    pub min_delay: Duration,
    /// Upper bound for the exponential part of the delay.
    pub max_delay: Duration,
    /// Whether ±25% random jitter is applied.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            min_delay: DEFAULT_MIN_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: false,
        }
    }

    /// Whether `err`, raised on zero-based `attempt`, deserves another try.
    #[must_use]
    pub fn should_retry(&self, attempt: u32, err: &Error) -> bool {
        attempt < self.max_retries && err.is_recoverable()
    }

    /// Delay to wait before retry number `attempt`.
    ///
    /// `retry_after` is the origin's own request, used as a lower bound. The
    /// result never exceeds `max_delay`, whatever the origin asks for.
    #[must_use]
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let factor = 1u32.checked_shl(attempt.min(31)).unwrap_or(u32::MAX);
        let base = self
            .min_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay);

        let delay = if self.jitter && !base.is_zero() {
            base.mul_f64(rand::rng().random_range(0.75..1.25))
        } else {
            base
        };

        let delay = delay.min(self.max_delay);
        retry_after.map_or(delay, |floor| delay.max(floor.min(self.max_delay)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    fn fixed() -> RetryPolicy {
        RetryPolicy {
            jitter: false,
            ..RetryPolicy::default()
        }
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.min_delay, Duration::from_secs(1));
        assert_eq!(policy.max_delay, Duration::from_secs(30));
        assert!(policy.jitter);
    }

    #[test]
    fn test_exponential_schedule_without_jitter() {
        let policy = fixed();
        assert_eq!(policy.delay_for(0, None), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1, None), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2, None), Duration::from_secs(4));
        assert_eq!(policy.delay_for(10, None), Duration::from_secs(30));
        assert_eq!(policy.delay_for(200, None), Duration::from_secs(30));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let policy = RetryPolicy::default();
        for _ in 0..100 {
            let delay = policy.delay_for(2, None);
            assert!(delay >= Duration::from_secs(3), "{delay:?} too short");
            assert!(delay < Duration::from_secs(5), "{delay:?} too long");
        }
    }

    #[test]
    fn test_retry_after_is_a_floor() {
        let policy = fixed();
        assert_eq!(
            policy.delay_for(0, Some(Duration::from_secs(9))),
            Duration::from_secs(9)
        );
        assert_eq!(
            policy.delay_for(3, Some(Duration::from_millis(10))),
            Duration::from_secs(8)
        );
    }

    #[test]
    fn test_retry_after_is_capped_at_max_delay() {
        let policy = fixed();
        assert_eq!(
            policy.delay_for(0, Some(Duration::from_secs(3600))),
            policy.max_delay
        );

        let jittered = RetryPolicy::default();
        for attempt in [0, 5, 30] {
            let delay = jittered.delay_for(attempt, Some(Duration::from_secs(3600)));
            assert_eq!(delay, jittered.max_delay);
        }
        for _ in 0..100 {
            assert!(jittered.delay_for(10, None) <= jittered.max_delay);
        }
    }

    #[test]
    fn test_should_retry_respects_budget_and_error_kind() {
        let policy = fixed();
        let transient = Error::Status {
            url: "https://example.com/sitemap.xml".to_string(),
            status: StatusCode::SERVICE_UNAVAILABLE,
            retry_after: None,
        };
        let permanent = Error::Parse("broken".to_string());

        assert!(policy.should_retry(0, &transient));
        assert!(policy.should_retry(2, &transient));
        assert!(!policy.should_retry(3, &transient));
        assert!(!policy.should_retry(0, &permanent));
        assert!(!RetryPolicy::none().should_retry(0, &transient));
    }
}
