use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

/// Statuses worth a second attempt: rate limiting and gateway hiccups.
pub const TRANSIENT_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Aggregate failure after a retry loop gave up.
#[derive(Debug, Clone, Error)]
#[error("request failed after {attempts} attempt(s): {last_error}")]
pub struct RetryError {
    pub attempts: u32,
    pub last_error: String,
}

/// Shared retry schedule used by every outbound call path, parameterized by
/// a retryable-condition predicate at each call site.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff_factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            backoff_factor: 2,
        }
    }
}

impl RetryPolicy {
    /// A policy that never sleeps between attempts.
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            backoff_factor: 2,
        }
    }

    /// Delay slept after the given 1-based attempt fails.
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay * self.backoff_factor.saturating_pow(exponent)
    }

    /// Run `op` until it succeeds, the predicate rejects the error, or the
    /// attempt cap is reached. The attempt number (1-based) is passed to
    /// `op` so callers can tag results with the attempt that succeeded.
    pub fn run<T, E, R, F>(&self, retryable: R, mut op: F) -> Result<T, RetryError>
    where
        E: std::fmt::Display,
        R: Fn(&E) -> bool,
        F: FnMut(u32) -> Result<T, E>,
    {
        let attempts = self.max_attempts.max(1);
        let mut last_error = String::new();
        for attempt in 1..=attempts {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(error) => {
                    last_error = error.to_string();
                    if !retryable(&error) {
                        return Err(RetryError {
                            attempts: attempt,
                            last_error,
                        });
                    }
                    if attempt < attempts {
                        let delay = self.delay_after(attempt);
                        debug!(attempt, delay_ms = delay.as_millis() as u64, %error, "retrying");
                        thread::sleep(delay);
                    }
                }
            }
        }
        Err(RetryError {
            attempts,
            last_error,
        })
    }
}
