//! Retry policy for a single source's retrievals.

use std::future::Future;
use std::time::Duration;

use log::warn;

use super::clock::Clock;
use crate::errors::{MarketDataError, RetryClass};

/// Total attempts per retrieval, including the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Exponential backoff: attempt `n` (zero-based) is followed by a wait of
/// `base_delay * 2^n` before attempt `n + 1`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl BackoffPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Whether a failure on `attempt` (zero-based) should be retried.
    pub fn should_retry(&self, attempt: u32, error: &MarketDataError) -> bool {
        attempt + 1 < self.max_attempts && error.retry_class() == RetryClass::WithBackoff
    }

    /// Run `operation` until it succeeds, fails terminally, or the attempt
    /// budget is spent. Attempts never overlap; the clock sleeps between
    /// them and never after the last one.
    pub async fn run<T, F, Fut>(
        &self,
        clock: &dyn Clock,
        source_id: &str,
        mut operation: F,
    ) -> Result<T, MarketDataError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, MarketDataError>>,
    {
        let mut attempt = 0;
        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    if !self.should_retry(attempt, &error) {
                        return Err(error);
                    }
                    let delay = self.delay_for(attempt);
                    warn!(
                        "'{}' attempt {}/{} failed with {}, retrying in {:?}",
                        source_id,
                        attempt + 1,
                        self.max_attempts,
                        error,
                        delay
                    );
                    clock.sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
