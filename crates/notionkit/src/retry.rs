//! Retry logic with exponential backoff for transient API errors.

use crate::error::{Error, Result};
use std::thread;
use std::time::Duration;

/// Retry policy for API calls.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub base_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_factor: f64,
    /// Maximum delay between attempts
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with custom settings.
    pub fn new(max_attempts: u32, base_delay: Duration, backoff_factor: f64) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff_factor,
            ..Default::default()
        }
    }

    /// Calculate the delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        let capped = delay.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped)
    }

    /// Create a config that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}

/// Callback trait for retry progress notifications.
pub trait RetryCallback {
    /// Called when an operation is being retried.
    ///
    /// # Arguments
    /// * `attempt` - Attempt that just failed (1-indexed)
    /// * `max_attempts` - Maximum number of attempts
    /// * `error` - The error that triggered the retry
    /// * `delay` - Time until next attempt
    fn on_retry(&self, attempt: u32, max_attempts: u32, error: &Error, delay: Duration);
}

/// No-op callback that does nothing.
pub struct NoCallback;

impl RetryCallback for NoCallback {
    fn on_retry(&self, _attempt: u32, _max_attempts: u32, _error: &Error, _delay: Duration) {}
}

/// Callback that reports retries through the `log` facade.
pub struct LogCallback;

impl RetryCallback for LogCallback {
    fn on_retry(&self, attempt: u32, max_attempts: u32, error: &Error, delay: Duration) {
        log::warn!(
            "Notion API attempt {}/{} failed: {}. Retrying in {:.1}s",
            attempt,
            max_attempts,
            error,
            delay.as_secs_f64()
        );
    }
}

/// Execute an operation with retry logic.
///
/// Retries the operation while it returns a retryable error, using
/// exponential backoff between attempts. When a rate-limit response names a
/// wait, that wait replaces the backoff.
pub fn with_retry<T, F>(config: &RetryConfig, callback: Option<&dyn RetryCallback>, operation: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    with_retry_if(config, callback, Error::is_retryable, operation)
}

/// Like [`with_retry`], but only errors accepted by `should_retry` are retried.
///
/// Non-idempotent requests use this to retry only failures the server is
/// known not to have acted on.
pub fn with_retry_if<T, P, F>(
    config: &RetryConfig,
    callback: Option<&dyn RetryCallback>,
    should_retry: P,
    mut operation: F,
) -> Result<T>
where
    P: Fn(&Error) -> bool,
    F: FnMut() -> Result<T>,
{
    let mut last_error: Option<Error> = None;

    for attempt in 0..config.max_attempts {
        match operation() {
            Ok(result) => return Ok(result),
            Err(e) => {
                if !should_retry(&e) {
                    return Err(e);
                }

                if attempt + 1 >= config.max_attempts {
                    last_error = Some(e);
                    break;
                }

                let delay = match e.retry_after() {
                    Some(secs) => Duration::from_secs(secs),
                    None => config.delay_for_attempt(attempt),
                };

                if let Some(cb) = callback {
                    cb.on_retry(attempt + 1, config.max_attempts, &e, delay);
                }

                thread::sleep(delay);

                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| Error::Other("retry exhausted".to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn fast_config() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            backoff_factor: 1.0,
            max_delay: Duration::from_millis(10),
        }
    }

    fn network_error() -> Error {
        Error::Network {
            message: "timeout".to_string(),
        }
    }

    #[test]
    fn test_default_is_three_attempts() {
        assert_eq!(RetryConfig::default().max_attempts, 3);
    }

    #[test]
    fn test_delay_for_attempt() {
        let config = RetryConfig::new(3, Duration::from_secs(1), 2.0);

        assert_eq!(config.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(4));
    }

    #[test]
    fn test_delay_is_capped() {
        let config = RetryConfig {
            max_delay: Duration::from_secs(3),
            ..RetryConfig::new(5, Duration::from_secs(1), 2.0)
        };

        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(3));
        assert_eq!(config.delay_for_attempt(4), Duration::from_secs(3));
    }

    #[test]
    fn test_with_retry_success_first_try() {
        let result = with_retry(&RetryConfig::no_retry(), None, || Ok::<_, Error>(42));
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn test_with_retry_not_found_is_not_retried() {
        let attempts = Rc::new(Cell::new(0));
        let attempts_clone = attempts.clone();

        let result: Result<()> = with_retry(&fast_config(), None, || {
            attempts_clone.set(attempts_clone.get() + 1);
            Err(Error::NotFound {
                message: "gone".to_string(),
            })
        });

        assert!(result.unwrap_err().is_not_found());
        assert_eq!(attempts.get(), 1);
    }

    #[test]
    fn test_with_retry_eventual_success() {
        let attempts = Rc::new(Cell::new(0));
        let attempts_clone = attempts.clone();

        let result = with_retry(&fast_config(), None, || {
            let current = attempts_clone.get();
            attempts_clone.set(current + 1);
            if current < 2 { Err(network_error()) } else { Ok(42) }
        });

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.get(), 3);
    }

    #[test]
    fn test_with_retry_all_attempts_fail() {
        let attempts = Rc::new(Cell::new(0));
        let attempts_clone = attempts.clone();

        let result: Result<()> = with_retry(&fast_config(), None, || {
            attempts_clone.set(attempts_clone.get() + 1);
            Err(network_error())
        });

        assert_eq!(result.unwrap_err(), network_error());
        assert_eq!(attempts.get(), 3);
    }

    #[test]
    fn test_callback_invoked_between_attempts() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicU32, Ordering};

        struct CountingCallback(Arc<AtomicU32>);
        impl RetryCallback for CountingCallback {
            fn on_retry(&self, _: u32, _: u32, _: &Error, _: Duration) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let callback_count = Arc::new(AtomicU32::new(0));
        let callback = CountingCallback(callback_count.clone());

        let _: Result<()> = with_retry(&fast_config(), Some(&callback), || Err(network_error()));

        // Not after the final attempt
        assert_eq!(callback_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_retry_after_replaces_backoff() {
        use std::sync::Mutex;

        struct Recorder(Mutex<Vec<Duration>>);
        impl RetryCallback for Recorder {
            fn on_retry(&self, _: u32, _: u32, _: &Error, delay: Duration) {
                self.0.lock().unwrap().push(delay);
            }
        }

        let config = RetryConfig {
            base_delay: Duration::from_secs(5),
            ..fast_config()
        };
        let recorder = Recorder(Mutex::new(Vec::new()));
        let attempts = Cell::new(0);

        let result = with_retry(&config, Some(&recorder), || {
            attempts.set(attempts.get() + 1);
            if attempts.get() == 1 {
                Err(Error::RateLimited {
                    message: "slow down".to_string(),
                    retry_after: Some(0),
                })
            } else {
                Ok(7)
            }
        });

        assert_eq!(result.unwrap(), 7);
        assert_eq!(*recorder.0.lock().unwrap(), vec![Duration::ZERO]);
    }

    #[test]
    fn test_with_retry_if_uses_predicate() {
        let attempts = Cell::new(0);
        let only_rate_limits = |e: &Error| matches!(e, Error::RateLimited { .. });

        let result: Result<()> = with_retry_if(&fast_config(), None, only_rate_limits, || {
            attempts.set(attempts.get() + 1);
            Err(network_error())
        });
        assert_eq!(result.unwrap_err(), network_error());
        assert_eq!(attempts.get(), 1);

        attempts.set(0);
        let result: Result<()> = with_retry_if(&fast_config(), None, only_rate_limits, || {
            attempts.set(attempts.get() + 1);
            Err(Error::RateLimited {
                message: "slow down".to_string(),
                retry_after: None,
            })
        });
        assert!(matches!(result, Err(Error::RateLimited { .. })));
        assert_eq!(attempts.get(), 3);
    }
}
