//! Bounded retry with exponential backoff for idempotent remote calls.
//!
//! Only wrap reads and other operations that are safe to repeat. Whether a
//! given failure is worth another attempt is decided by the caller.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Backoff policy for [`retry_call`].
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Retries after the first attempt; zero disables retrying.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
    /// Adds up to 25% random delay to each backoff.
    pub add_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            add_jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    pub fn no_retry() -> Self {
        Self::with_max_retries(0)
    }

    fn backoff_duration(&self, retry: u32) -> Duration {
        let exponential =
            self.initial_backoff.as_millis() as f64 * self.backoff_multiplier.powi(retry as i32);
        let capped_ms = exponential.min(self.max_backoff.as_millis() as f64) as u64;

        let jitter_ms = if self.add_jitter {
            (capped_ms as f64 * 0.25 * rand::random::<f64>()) as u64
        } else {
            0
        };

        Duration::from_millis(capped_ms + jitter_ms)
    }
}

/// Execute a remote call, retrying failures that `is_retryable` accepts.
///
/// # Example
/// ```ignore
/// let status = retry_call(
///     &RetryConfig::default(),
///     "describe_create_account_status",
///     ControlPlaneError::is_transient,
///     || client.describe_account_request(&request_id),
/// ).await?;
/// ```
pub async fn retry_call<F, Fut, T, E, P>(
    config: &RetryConfig,
    operation_name: &str,
    is_retryable: P,
    f: F,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    P: Fn(&E) -> bool,
{
    let mut attempt = 0;

    loop {
        match f().await {
            Ok(result) => {
                if attempt > 0 {
                    info!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        "Call succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) => {
                if !is_retryable(&err) {
                    warn!(
                        operation = operation_name,
                        error = %err,
                        "Call failed with non-retryable error"
                    );
                    return Err(err);
                }

                if attempt >= config.max_retries {
                    warn!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        error = %err,
                        "Call failed after max retries"
                    );
                    return Err(err);
                }

                let backoff = config.backoff_duration(attempt);
                warn!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    error = %err,
                    backoff_ms = backoff.as_millis() as u64,
                    "Call failed, retrying after backoff"
                );

                sleep(backoff).await;
                attempt += 1;
            }
        }
    }
}
