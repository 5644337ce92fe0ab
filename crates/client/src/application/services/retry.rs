//! Bounded retry with exponential backoff
//!
//! A reusable primitive for any fallible async operation. Between attempts (never
//! after the last one) it sleeps for the current delay, then multiplies the delay by
//! `factor`, capped at `max_delay`. The final attempt's error is returned as-is.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Default attempt count
pub const DEFAULT_RETRY_TIMES: u32 = 3;
/// Default delay before the second attempt, in milliseconds
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 1_000;
/// Default delay cap, in milliseconds
pub const DEFAULT_MAX_DELAY_MS: u64 = 10_000;
/// Default growth factor between delays
pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

/// Retry configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one; 0 and 1 both mean a single attempt
    pub times: u32,
    pub initial_delay: Duration,
    pub factor: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            times: DEFAULT_RETRY_TIMES,
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            factor: DEFAULT_BACKOFF_FACTOR,
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    pub fn new(times: u32, initial_delay: Duration, factor: f64, max_delay: Duration) -> Self {
        Self {
            times,
            initial_delay,
            factor,
            max_delay,
        }
    }

    /// One attempt, no waiting
    pub fn none() -> Self {
        Self {
            times: 1,
            ..Self::default()
        }
    }

    fn attempts(&self) -> u32 {
        self.times.max(1)
    }

    /// Delay that follows `current`, capped at `max_delay`.
    pub fn next_delay(&self, current: Duration) -> Duration {
        let grown = (current.as_nanos() as f64 * self.factor).round();
        if !grown.is_finite() || grown < 0.0 || grown >= self.max_delay.as_nanos() as f64 {
            return self.max_delay;
        }
        Duration::from_nanos(grown as u64)
    }
}

/// Retry `operation` on every error.
pub async fn retry_io<T, E, F, Fut>(policy: &RetryPolicy, operation: F) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    retry_io_if(policy, |_| true, operation).await
}

/// Retry `operation` while `should_retry` accepts the error.
///
/// A rejected error is returned immediately without sleeping.
pub async fn retry_io_if<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    mut should_retry: P,
    mut operation: F,
) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: FnMut(&E) -> bool,
{
    let max_attempts = policy.attempts();
    let mut delay = policy.initial_delay;
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(attempt, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if attempt < max_attempts && should_retry(&e) => {
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Operation failed, retrying..."
                );
                tokio::time::sleep(delay).await;
                delay = policy.next_delay(delay);
                attempt += 1;
            }
            Err(e) => {
                if attempt > 1 {
                    tracing::error!(
                        attempts = attempt,
                        error = %e,
                        "Operation failed after retries"
                    );
                }
                return Err(e);
            }
        }
    }
}
