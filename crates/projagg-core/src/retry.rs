//! Bounded retry for calls into the automation surface.

use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retries after the first attempt.
pub const DEFAULT_RETRIES: u32 = 10;

/// Fixed pause between attempts.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(3);

/// Fixed-delay retry policy.
///
/// An operation is run up to `retries + 1` times. Attempts are sequential;
/// when the budget runs out the last error from the operation is returned
/// unchanged. Only automation failures are retried; input errors such as
/// [`Error::PathNotFound`] or [`Error::HostNotFound`] are returned at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            delay: DEFAULT_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(retries: u32, delay: Duration) -> Self {
        Self { retries, delay }
    }

    /// Run once with no retries.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Total number of times an operation may run.
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Whether a failed attempt should be tried again.
    pub fn should_retry(&self, error: &Error) -> bool {
        error.is_automation_failure()
    }

    /// Run `op`, retrying automation failures until the budget is spent.
    pub async fn attempt<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut remaining = self.retries;
        let mut attempt = 1u32;

        loop {
            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("{} succeeded on attempt {}", label, attempt);
                    }
                    return Ok(value);
                }
                Err(e) if remaining > 0 && self.should_retry(&e) => {
                    warn!(
                        "{} failed (attempt {}/{}): {}",
                        label,
                        attempt,
                        self.max_attempts(),
                        e
                    );
                    remaining -= 1;
                    attempt += 1;
                    tokio::time::sleep(self.delay).await;
                }
                Err(e) if !self.should_retry(&e) => {
                    debug!("{} failed with a non-retryable error: {}", label, e);
                    return Err(e);
                }
                Err(e) => {
                    warn!("{} failed after {} attempt(s): {}", label, attempt, e);
                    return Err(e);
                }
            }
        }
    }
}
