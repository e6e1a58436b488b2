//! Retry logic with exponential backoff
//!
//! Tools wrap their outbound provider calls in a [`RetryPolicy`]. Only errors
//! that report themselves as [`Transient`] are retried; "no data" and bad
//! input fail on the first attempt.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Classifies errors worth another attempt
pub trait Transient {
    /// Network failures, timeouts, rate limiting and 5xx responses
    fn is_transient(&self) -> bool;
}

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Delay before the first retry
    pub initial_backoff: Duration,

    /// Upper bound for any single delay
    pub max_backoff: Duration,

    /// Growth factor between consecutive delays
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(
        max_attempts: u32,
        initial_backoff: Duration,
        max_backoff: Duration,
        backoff_multiplier: f64,
    ) -> Self {
        Self {
            max_attempts,
            initial_backoff,
            max_backoff,
            backoff_multiplier,
        }
    }

    /// A single attempt, no retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }

    /// Millisecond delays, for tests
    pub fn fast() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
            backoff_multiplier: 2.0,
        }
    }

    /// Delay before retry number `retry` (1-based)
    pub fn backoff_duration(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(retry - 1).unwrap_or(i32::MAX);
        let millis = self.initial_backoff.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        let backoff = Duration::from_millis(millis.min(u64::MAX as f64) as u64);

        backoff.min(self.max_backoff)
    }

    /// Run `operation` until it succeeds, fails permanently, or attempts run out
    pub async fn execute<F, Fut, T, E>(&self, operation_name: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Transient + Display,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation = operation_name, attempt, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if e.is_transient() && attempt < attempts => {
                    let backoff = self.backoff_duration(attempt);
                    warn!(
                        operation = operation_name,
                        attempt,
                        max_attempts = attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Transient failure, retrying"
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_transient() {
                        warn!(operation = operation_name, attempt, error = %e, "Retries exhausted");
                    }
                    return Err(e);
                }
            }
        }
    }
}
