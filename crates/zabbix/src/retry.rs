//! Retry logic with exponential backoff for transient transport errors.
//!
//! Only errors whose category is retryable (network failures and 5xx
//! responses) are attempted again. An API-level rejection is final.

use crate::error::{Error, Result};
use std::thread;
use std::time::Duration;

/// Configuration for retry logic.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_factor: f64,
    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    /// Default backoff with a custom attempt count
    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Default::default()
        }
    }

    /// Calculate the delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        Duration::from_secs_f64(delay.min(self.max_delay.as_secs_f64()))
    }

    /// Create a config that never retries.
    pub fn no_retry() -> Self {
        Self::with_attempts(1)
    }
}

/// Callback trait for retry notifications.
pub trait RetryCallback: Send + Sync {
    /// Called before sleeping ahead of attempt `attempt + 1`.
    fn on_retry(&self, attempt: u32, max_attempts: u32, error: &Error, delay: Duration);
}

/// Logs each retry at warn level.
pub struct LogCallback;

impl RetryCallback for LogCallback {
    fn on_retry(&self, attempt: u32, max_attempts: u32, error: &Error, delay: Duration) {
        log::warn!(
            "Attempt {attempt}/{max_attempts} failed: {error}. Retrying in {}ms",
            delay.as_millis()
        );
    }
}

/// Execute an operation with retry logic.
///
/// # Returns
/// The first success, the first non-retryable error, or the last error once
/// all attempts are spent.
pub fn with_retry<T, F>(
    config: &RetryConfig,
    callback: Option<&dyn RetryCallback>,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        let err = match operation() {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };
        if !err.is_retryable() || attempt + 1 >= max_attempts {
            return Err(err);
        }

        let delay = config.delay_for_attempt(attempt);
        if let Some(cb) = callback {
            cb.on_retry(attempt + 1, max_attempts, &err, delay);
        }
        thread::sleep(delay);
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            base_delay: Duration::from_millis(1),
            backoff_factor: 1.0,
            max_delay: Duration::from_millis(5),
        }
    }

    fn network() -> Error {
        Error::Network {
            message: "connection reset".to_string(),
        }
    }

    #[test]
    fn test_delay_for_attempt() {
        let config = RetryConfig {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(5),
        };
        assert_eq!(config.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(4));
        assert_eq!(config.delay_for_attempt(3), Duration::from_secs(5));
    }

    #[test]
    fn test_zero_attempts_still_runs_once() {
        assert_eq!(RetryConfig::with_attempts(0).max_attempts, 1);
        let calls = Cell::new(0);
        let config = RetryConfig {
            max_attempts: 0,
            ..fast(0)
        };
        let result = with_retry(&config, None, || {
            calls.set(calls.get() + 1);
            Ok::<_, Error>(1)
        });
        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_api_error_not_retried() {
        let calls = Cell::new(0);
        let result: Result<()> = with_retry(&fast(3), None, || {
            calls.set(calls.get() + 1);
            Err(Error::Api {
                code: -32602,
                message: "Invalid params.".into(),
                data: String::new(),
            })
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_eventual_success() {
        let calls = Cell::new(0);
        let result = with_retry(&fast(3), None, || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 { Err(network()) } else { Ok(42) }
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_exhausted_returns_last_error() {
        let calls = Cell::new(0);
        let result: Result<()> = with_retry(&fast(2), None, || {
            calls.set(calls.get() + 1);
            Err(network())
        });
        assert!(matches!(result, Err(Error::Network { .. })));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_callback_invoked_between_attempts() {
        struct Counting(Arc<AtomicU32>);
        impl RetryCallback for Counting {
            fn on_retry(&self, _: u32, _: u32, _: &Error, _: Duration) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let count = Arc::new(AtomicU32::new(0));
        let callback = Counting(count.clone());
        let _: Result<()> = with_retry(&fast(3), Some(&callback), || Err(network()));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
