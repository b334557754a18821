//! Retry policy for transient fetch failures
//!
//! | Condition | Action |
//! |-----------|--------|
//! | HTTP 5xx | Retry with backoff |
//! | HTTP 429 | Retry with backoff |
//! | Timeout | Retry with backoff |
//! | Connection failure | Retry with backoff |
//! | Any other error | Fail immediately |

use crate::config::FetchConfig;
use crate::crawler::FetchError;
use std::future::Future;
use std::time::Duration;

/// Longest pause between two attempts
const MAX_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Exponential backoff with a cap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Delay before the first retry; doubled for every later one
    pub base_delay: Duration,

    /// Upper bound of any single delay
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Builds the policy from the fetcher configuration
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            max_retries: config.max_retry_times,
            base_delay: Duration::from_millis(config.retry_base_delay),
            max_delay: MAX_RETRY_DELAY,
        }
    }

    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (0 for the first retry)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Runs `operation` until it succeeds, fails permanently, or retries run out
    pub async fn run<T, F, Fut>(&self, url: &str, mut operation: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut retry = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && retry < self.max_retries => {
                    let delay = self.delay_for(retry);
                    tracing::warn!(
                        "Transient failure for {} ({}), retry {}/{} in {:?}",
                        url,
                        e,
                        retry + 1,
                        self.max_retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}
