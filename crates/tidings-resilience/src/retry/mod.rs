//! Retry policy implementation.
//!
//! The executor is stateless: a [`RetryPolicy`] only holds the backoff
//! parameters and can be shared by any number of concurrent operations.
//! Whether an error is worth retrying is decided by the error itself
//! ([`Retryable`]) or by an explicit predicate.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tidings_core::TidingsError;
use tracing::{debug, warn};

/// Errors that know whether a retry may succeed.
pub trait Retryable {
    /// Returns true when the failed operation may succeed if attempted again.
    fn is_retryable(&self) -> bool;
}

impl Retryable for TidingsError {
    fn is_retryable(&self) -> bool {
        self.is_retriable()
    }
}

/// Information about an upcoming retry, handed to retry observers.
#[derive(Debug)]
pub struct RetryAttempt<'a, E> {
    /// Number of the attempt about to be made (the first retry is 2).
    pub attempt_number: u32,
    /// Sleep applied before this attempt.
    pub delay: Duration,
    /// Error that caused the retry.
    pub last_error: &'a E,
}

/// Retry policy configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each retry.
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(5000),
            backoff_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy with the specified max attempts.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// Delay slept after the `failed_attempt`-th failure.
    ///
    /// `min(initial_delay * backoff_factor^(failed_attempt - 1), max_delay)`;
    /// zero for attempt 0.
    #[must_use]
    pub fn delay_for_attempt(&self, failed_attempt: u32) -> Duration {
        if failed_attempt == 0 {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(failed_attempt - 1).unwrap_or(i32::MAX);
        let factor = self.backoff_factor.max(1.0);
        let delay_secs = self.initial_delay.as_secs_f64() * factor.powi(exponent);
        let capped = delay_secs.min(self.max_delay.as_secs_f64());

        Duration::try_from_secs_f64(capped).unwrap_or(self.max_delay)
    }

    /// Worst-case total sleep time across all retries.
    #[must_use]
    pub fn total_backoff(&self) -> Duration {
        (1..self.max_attempts.max(1))
            .map(|attempt| self.delay_for_attempt(attempt))
            .sum()
    }

    /// Executes a function with retry logic, retrying errors that report
    /// themselves as retryable.
    pub async fn execute<F, Fut, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + Display,
    {
        self.execute_with(E::is_retryable, f).await
    }

    /// Executes a function with retry logic and an explicit retry predicate.
    pub async fn execute_with<F, Fut, T, E, P>(&self, should_retry: P, f: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        P: Fn(&E) -> bool,
    {
        self.execute_observed(should_retry, |_| {}, f).await
    }

    /// Executes a function with retry logic, reporting every retry to
    /// `on_retry` before sleeping.
    ///
    /// The operation runs at most `max_attempts` times (at least once). The
    /// last error is returned unchanged once attempts are exhausted or the
    /// predicate rejects it.
    pub async fn execute_observed<F, Fut, T, E, P, O>(
        &self,
        should_retry: P,
        mut on_retry: O,
        mut f: F,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        P: Fn(&E) -> bool,
        O: FnMut(&RetryAttempt<'_, E>),
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match f().await {
                Ok(result) => {
                    if attempt > 1 {
                        debug!("Attempt {} succeeded", attempt);
                    }
                    return Ok(result);
                }
                Err(e) => {
                    if !should_retry(&e) {
                        debug!("Attempt {} failed with non-retryable error: {}", attempt, e);
                        return Err(e);
                    }
                    if attempt >= max_attempts {
                        warn!("Giving up after {} attempts: {}", attempt, e);
                        return Err(e);
                    }

                    let delay = self.delay_for_attempt(attempt);
                    on_retry(&RetryAttempt {
                        attempt_number: attempt + 1,
                        delay,
                        last_error: &e,
                    });
                    debug!("Attempt {} failed: {}; retrying in {:?}", attempt, e, delay);

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
