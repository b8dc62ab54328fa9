//! Per-request retry with linear backoff.
//!
//! [`RetryPolicy::run`] wraps one fallible request and classifies its final
//! result into a [`RetryOutcome`]:
//!
//! - success returns [`RetryOutcome::Value`] immediately;
//! - the source's "not found" response returns [`RetryOutcome::Sentinel`]
//!   without retrying, since callers treat it as a meaningful answer;
//! - retriable errors ([`FetchError::is_retriable`]) sleep
//!   `base_delay_ms * attempt` and try again, up to `max_attempts` total;
//! - anything else, or the last retriable error, returns
//!   [`RetryOutcome::GaveUp`].
//!
//! # Backoff schedule (example with `base_delay_ms = 1500`, `max_attempts = 3`)
//!
//! | Attempt | Sleep after failure |
//! |---------|---------------------|
//! | 1 | 1.5 s |
//! | 2 | 3.0 s |
//! | 3 | none (gave up) |

use std::future::Future;
use std::time::Duration;

use crate::error::FetchError;

/// Retry budget for a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Values below 1 are treated as 1.
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

/// Final classification of a retried request.
#[derive(Debug)]
pub enum RetryOutcome<T> {
    Value(T),
    /// The source answered "not found".
    Sentinel,
    /// Attempts were exhausted or the error was not retriable.
    GaveUp(FetchError),
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            base_delay_ms,
        }
    }

    /// Sleep applied after the failed `attempt` (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.base_delay_ms.saturating_mul(u64::from(attempt)))
    }

    /// Runs `operation` under this policy. `target` names the request in logs.
    pub async fn run<T, F, Fut>(&self, target: &str, mut operation: F) -> RetryOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1u32;

        loop {
            let err = match operation().await {
                Ok(value) => return RetryOutcome::Value(value),
                Err(err) if err.is_not_found() => return RetryOutcome::Sentinel,
                Err(err) => err,
            };

            if !err.is_retriable() || attempt >= max_attempts {
                tracing::warn!(
                    target_request = target,
                    attempt,
                    max_attempts,
                    error = %err,
                    "request failed; giving up"
                );
                return RetryOutcome::GaveUp(err);
            }

            let delay = self.delay_after(attempt);
            tracing::warn!(
                target_request = target,
                attempt,
                max_attempts,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "transient fetch error, retrying after backoff"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
