//! Retry utilities with exponential backoff.
//!
//! Reads against the access-control store are idempotent and retried on
//! transient failures; writes are never passed through here.
//!
//! # Example
//!
//! ```rust,no_run
//! use report_access::retry::{with_retry_if, RetryConfig};
//!
//! #[derive(Debug)]
//! enum FetchError {
//!     Transient,
//!     Permanent,
//! }
//!
//! async fn example() -> Result<u32, FetchError> {
//!     with_retry_if(
//!         &RetryConfig::default(),
//!         || async { Err(FetchError::Transient) },
//!         |err| matches!(err, FetchError::Transient),
//!     )
//!     .await
//! }
//! ```

use std::time::Duration;
use tokio::time::sleep;

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts (the first call included)
    pub max_attempts: u32,

    /// Initial delay before the first retry
    pub initial_delay: Duration,

    /// Maximum delay between retries
    pub max_delay: Duration,

    /// Base for exponential backoff (typically 2.0)
    pub exponential_base: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            exponential_base: 2.0,
        }
    }
}

impl RetryConfig {
    /// Default backoff with a custom number of attempts (at least one).
    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Create a configuration that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::from_millis(0),
            max_delay: Duration::from_millis(0),
            exponential_base: 1.0,
        }
    }
}

/// Execute a function with retries, retrying only errors the predicate accepts.
///
/// # Arguments
///
/// * `config` - Retry configuration
/// * `f` - Function to execute
/// * `is_retryable` - Predicate to determine if an error is retryable
///
/// # Returns
///
/// The result of the function call, or the error if it's not retryable
/// or all attempts fail
pub async fn with_retry_if<F, Fut, T, E, P>(config: &RetryConfig, mut f: F, mut is_retryable: P) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Debug,
    P: FnMut(&E) -> bool,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        attempt += 1;

        match f().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(attempts = attempt, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if !is_retryable(&e) => {
                tracing::debug!(error = ?e, "Error is not retryable, returning immediately");
                return Err(e);
            }
            Err(e) if attempt >= config.max_attempts => {
                tracing::error!(attempts = attempt, error = ?e, "All retry attempts exhausted");
                return Err(e);
            }
            Err(e) => {
                tracing::warn!(
                    attempt = attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = ?e,
                    "Attempt failed, retrying"
                );

                sleep(delay).await;

                delay = Duration::from_secs_f64(
                    (delay.as_secs_f64() * config.exponential_base).min(config.max_delay.as_secs_f64()),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn quick(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            exponential_base: 2.0,
        }
    }

    #[test]
    fn test_retry_config_presets() {
        assert_eq!(RetryConfig::default().max_attempts, 3);
        assert_eq!(RetryConfig::no_retry().max_attempts, 1);
        assert_eq!(RetryConfig::with_attempts(0).max_attempts, 1);
        assert_eq!(RetryConfig::with_attempts(5).max_attempts, 5);
    }

    #[tokio::test]
    async fn test_succeeds_after_retries() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = with_retry_if(
            &quick(3),
            || {
                let counter = counter_clone.clone();
                async move {
                    let count = counter.fetch_add(1, Ordering::SeqCst);
                    if count < 2 {
                        Err("not yet")
                    } else {
                        Ok(42)
                    }
                }
            },
            |_| true,
        )
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausts_attempts() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = with_retry_if(
            &quick(2),
            || {
                let counter = counter_clone.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, _>("always fails")
                }
            },
            |_| true,
        )
        .await;

        assert_eq!(result, Err("always fails"));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_retryable_error_returns_immediately() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = with_retry_if(
            &quick(5),
            || {
                let counter = counter_clone.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, _>("permanent failure")
                }
            },
            |_| false,
        )
        .await;

        assert_eq!(result, Err("permanent failure"));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
