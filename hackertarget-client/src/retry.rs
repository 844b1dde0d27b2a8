//! Retry policy
//!
//! Pure decision logic: given what happened on the last attempt and how many
//! attempts were made, either stop (with the final error, if any) or wait and
//! try again. No clocks, no randomness, so every delay is reproducible.

use std::time::Duration;

use crate::classifier::Classification;
use crate::config::RetryConfig;
use crate::error::{ErrorInfo, ErrorKind};

/// Per-query retry bookkeeping; lives only for one `query()` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryState {
    /// Sends made so far.
    pub attempt: u32,
    pub last_error: Option<ErrorKind>,
    pub next_delay: Duration,
}

/// What the executor does next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Finish; `None` means the attempt succeeded.
    Stop(Option<ErrorInfo>),
    /// Wait this long, then send again.
    Retry(Duration),
}

#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Decide what follows `classification`.
    ///
    /// # Retry strategy
    /// - Success, validation failures, malformed responses, rejected targets and
    ///   permanent API errors stop immediately
    /// - Rate limits wait for the server's `Retry-After` (clamped to `max_delay`),
    ///   or back off exponentially when none was given
    /// - Timeouts, connection/TLS failures and 5xx back off exponentially
    /// - After `max_retries` retries the last error is returned, marked exhausted
    pub fn next(&self, classification: &Classification, state: &RetryState) -> RetryDecision {
        let retry_after = match classification {
            Classification::Success(_) => return RetryDecision::Stop(None),
            Classification::RateLimited { retry_after, .. } => *retry_after,
            Classification::Transport(_)
            | Classification::ApiError {
                transient: true, ..
            } => None,
            Classification::Validation(_)
            | Classification::Malformed { .. }
            | Classification::InvalidTarget { .. }
            | Classification::ApiError {
                transient: false, ..
            } => return RetryDecision::Stop(classification.error_info()),
        };

        if state.attempt > self.config.max_retries {
            return RetryDecision::Stop(classification.error_info().map(ErrorInfo::exhausted));
        }

        let retry_index = state.attempt.saturating_sub(1);
        let delay = retry_after.map_or_else(
            || self.backoff_delay(retry_index),
            |after| after.min(self.config.max_delay),
        );
        RetryDecision::Retry(delay)
    }

    /// Exponential backoff for the `retry_index`-th retry (0-based):
    /// `base × multiplier^retry_index`, capped at `max_delay`.
    ///
    /// With the defaults: 0.5s, 1s, 2s, 4s, ... up to 60s. A multiplier below
    /// 1 is treated as 1 so the sequence never decreases.
    pub fn backoff_delay(&self, retry_index: u32) -> Duration {
        let factor = self
            .config
            .backoff_multiplier
            .max(1)
            .checked_pow(retry_index)
            .unwrap_or(u32::MAX);
        self.config
            .backoff_base
            .checked_mul(factor)
            .unwrap_or(Duration::MAX)
            .min(self.config.max_delay)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::{TransportError, ValidationError};

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(RetryConfig::default().max_retries(max_retries))
    }

    fn state(attempt: u32) -> RetryState {
        RetryState {
            attempt,
            ..RetryState::default()
        }
    }

    fn server_error() -> Classification {
        Classification::ApiError {
            message: "HTTP 500 server error".into(),
            status: Some(500),
            transient: true,
        }
    }

    // ---- stop immediately ----

    #[test]
    fn success_stops_without_error() {
        let d = policy(3).next(&Classification::Success("ok".into()), &state(1));
        assert_eq!(d, RetryDecision::Stop(None));
    }

    #[test]
    fn validation_never_retried() {
        let c = Classification::from(ValidationError::new("domain", "bad"));
        let d = policy(3).next(&c, &state(0));
        assert!(matches!(d, RetryDecision::Stop(Some(ref e)) if e.kind == ErrorKind::Validation && !e.exhausted));
    }

    #[test]
    fn malformed_never_retried() {
        let c = Classification::Malformed {
            message: "binary".into(),
            status: 200,
        };
        assert!(matches!(policy(3).next(&c, &state(1)), RetryDecision::Stop(Some(_))));
    }

    #[test]
    fn permanent_api_error_never_retried() {
        let c = Classification::ApiError {
            message: "HTTP 404".into(),
            status: Some(404),
            transient: false,
        };
        assert!(matches!(policy(3).next(&c, &state(1)), RetryDecision::Stop(Some(_))));
        let c = Classification::InvalidTarget {
            message: "error check your search parameter".into(),
            status: 200,
        };
        assert!(matches!(policy(3).next(&c, &state(1)), RetryDecision::Stop(Some(_))));
    }

    // ---- retry ----

    #[test]
    fn server_error_backs_off() {
        let p = policy(3);
        assert_eq!(p.next(&server_error(), &state(1)), RetryDecision::Retry(Duration::from_millis(500)));
        assert_eq!(p.next(&server_error(), &state(2)), RetryDecision::Retry(Duration::from_secs(1)));
        assert_eq!(p.next(&server_error(), &state(3)), RetryDecision::Retry(Duration::from_secs(2)));
    }

    #[test]
    fn transport_errors_retried() {
        let p = policy(1);
        for e in [
            TransportError::timeout("t"),
            TransportError::connection("c"),
            TransportError::tls("x"),
        ] {
            assert!(matches!(p.next(&e.into(), &state(1)), RetryDecision::Retry(_)));
        }
    }

    #[test]
    fn rate_limit_uses_retry_after() {
        let c = Classification::RateLimited {
            retry_after: Some(Duration::from_secs(2)),
            message: "HTTP 429".into(),
            status: 429,
        };
        assert_eq!(policy(3).next(&c, &state(1)), RetryDecision::Retry(Duration::from_secs(2)));
    }

    #[test]
    fn rate_limit_retry_after_clamped() {
        let c = Classification::RateLimited {
            retry_after: Some(Duration::from_secs(3600)),
            message: "HTTP 429".into(),
            status: 429,
        };
        assert_eq!(policy(3).next(&c, &state(1)), RetryDecision::Retry(Duration::from_secs(60)));
    }

    #[test]
    fn rate_limit_without_header_backs_off() {
        let c = Classification::RateLimited {
            retry_after: None,
            message: "API count exceeded".into(),
            status: 200,
        };
        assert_eq!(policy(3).next(&c, &state(2)), RetryDecision::Retry(Duration::from_secs(1)));
    }

    // ---- exhaustion ----

    #[test]
    fn exhausted_after_max_retries() {
        let p = policy(2);
        assert!(matches!(p.next(&server_error(), &state(2)), RetryDecision::Retry(_)));
        let d = p.next(&server_error(), &state(3));
        assert!(matches!(d, RetryDecision::Stop(Some(ref e)) if e.exhausted && e.kind == ErrorKind::ApiError));
    }

    #[test]
    fn zero_retries_stops_after_first_attempt() {
        let d = policy(0).next(&server_error(), &state(1));
        assert!(matches!(d, RetryDecision::Stop(Some(ref e)) if e.exhausted));
    }

    #[test]
    fn always_stops_eventually() {
        let p = policy(5);
        let mut attempts = 0;
        for attempt in 1..100 {
            attempts = attempt;
            if matches!(p.next(&server_error(), &state(attempt)), RetryDecision::Stop(_)) {
                break;
            }
        }
        assert_eq!(attempts, 6);
    }

    // ---- backoff_delay ----

    #[test]
    fn backoff_sequence() {
        let p = policy(3);
        assert_eq!(p.backoff_delay(0), Duration::from_millis(500));
        assert_eq!(p.backoff_delay(1), Duration::from_secs(1));
        assert_eq!(p.backoff_delay(2), Duration::from_secs(2));
        assert_eq!(p.backoff_delay(3), Duration::from_secs(4));
    }

    #[test]
    fn backoff_capped() {
        // 0.5s * 2^7 = 64s, capped to 60s
        assert_eq!(policy(3).backoff_delay(7), Duration::from_secs(60));
        assert_eq!(policy(3).backoff_delay(u32::MAX), Duration::from_secs(60));
    }

    #[test]
    fn backoff_non_decreasing() {
        let p = policy(3);
        let delays: Vec<Duration> = (0..40).map(|i| p.backoff_delay(i)).collect();
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn zero_multiplier_never_shrinks_backoff() {
        let p = RetryPolicy::new(RetryConfig::default().backoff_multiplier(0));
        let delays: Vec<Duration> = (0..4).map(|i| p.backoff_delay(i)).collect();
        assert_eq!(delays, vec![Duration::from_millis(500); 4]);
    }

    #[test]
    fn backoff_deterministic() {
        let a = policy(3);
        let b = policy(3);
        for i in 0..10 {
            assert_eq!(a.backoff_delay(i), b.backoff_delay(i));
        }
    }
}
