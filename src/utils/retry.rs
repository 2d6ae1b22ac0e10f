//! Retry with exponential backoff.
//!
//! Only errors flagged `retryable` are retried. The delay doubles after each
//! attempt, starting at `base_delay` and capped at `max_delay`.

use std::future::Future;
use std::time::Duration;

use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::RetryIf;

use crate::config::{RETRY_BASE_DELAY_MS, RETRY_MAX_DELAY_MS, RETRY_MAX_RETRIES};
use crate::error_handling::AnalysisError;

/// Backoff parameters for one service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Retries after the first attempt
    pub max_retries: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(RETRY_BASE_DELAY_MS),
            max_delay: Duration::from_millis(RETRY_MAX_DELAY_MS),
            max_retries: RETRY_MAX_RETRIES,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Delays between attempts: `base`, `2*base`, `4*base`, ... capped at `max_delay`.
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        // ExponentialBackoff yields 2^n ms scaled by the factor, so base/2 doubles from base
        let base_ms = self.base_delay.as_millis() as u64;
        ExponentialBackoff::from_millis(2)
            .factor((base_ms / 2).max(1))
            .max_delay(self.max_delay)
            .take(self.max_retries)
    }
}

/// Runs `action` until it succeeds, fails with a non-retryable error, or the
/// policy runs out of retries. The last error is returned.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    action: F,
) -> Result<T, AnalysisError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AnalysisError>>,
{
    RetryIf::spawn(policy.delays(), action, |err: &AnalysisError| {
        if err.retryable {
            log::warn!("{operation} failed ({err}), retrying");
        } else {
            log::debug!("{operation} failed with non-retryable error: {err}");
        }
        err.retryable
    })
    .await
}
