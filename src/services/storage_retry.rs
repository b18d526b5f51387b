//! Bounded retry with exponential backoff for durable-store operations.
//!
//! Every attempt is bounded by a timeout. Transient failures and timeouts are
//! retried up to `max_retries` times; after that the operation surfaces as
//! `StorageUnavailable`. Non-transient errors are returned immediately.

use std::future::Future;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use tracing::{debug, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::StorageConfig;

#[derive(Debug, Clone)]
pub struct StorageRetryPolicy {
    max_retries: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
    operation_timeout: Duration,
}

impl Default for StorageRetryPolicy {
    fn default() -> Self {
        Self::from(&StorageConfig::default())
    }
}

impl From<&StorageConfig> for StorageRetryPolicy {
    fn from(config: &StorageConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_millis(config.initial_backoff_ms),
            Duration::from_millis(config.max_backoff_ms),
            Duration::from_millis(config.operation_timeout_ms),
        )
    }
}

impl StorageRetryPolicy {
    pub fn new(
        max_retries: u32,
        initial_backoff: Duration,
        max_backoff: Duration,
        operation_timeout: Duration,
    ) -> Self {
        Self {
            max_retries,
            initial_backoff,
            max_backoff: max_backoff.max(initial_backoff),
            operation_timeout,
        }
    }

    /// Total attempts including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_backoff)
            .with_max_interval(self.max_backoff)
            .with_multiplier(2.0)
            .with_randomization_factor(0.2)
            .with_max_elapsed_time(None)
            .build()
    }

    /// Run `op` under the policy. `operation` names it in logs and errors.
    pub async fn execute<F, Fut, T>(&self, operation: &str, mut op: F) -> DomainResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = DomainResult<T>>,
    {
        let mut backoff = self.backoff();
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let failure = match tokio::time::timeout(self.operation_timeout, op()).await {
                Ok(Ok(value)) => {
                    if attempt > 1 {
                        debug!(operation, attempt, "storage operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Ok(Err(err)) if !err.is_transient() => return Err(err),
                Ok(Err(err)) => err.to_string(),
                Err(_) => format!("timed out after {}ms", self.operation_timeout.as_millis()),
            };

            if attempt >= self.max_attempts() {
                warn!(
                    operation,
                    attempts = attempt,
                    error = %failure,
                    "storage operation failed; giving up"
                );
                return Err(DomainError::StorageUnavailable {
                    operation: operation.to_string(),
                    attempts: attempt,
                    reason: failure,
                });
            }

            let delay = backoff.next_backoff().unwrap_or(self.max_backoff);
            warn!(
                operation,
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %failure,
                "storage operation failed; retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
