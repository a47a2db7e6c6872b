//! Generic retry strategy implementation with proper error handling and
//! extensibility
//!
//! Retries an async operation under a [`RetryPolicy`] that classifies each
//! failure, sleeping between attempts according to an [`ExponentialBackoff`].
//! Policies may demand a minimum delay (a server's Retry-After hint), which
//! is honoured when larger than the computed backoff.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Errors that can occur during retry operations
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// All retry attempts have been exhausted; `source` is the last failure
    #[error("All retry attempts exhausted after {attempts} tries: {source:?}")]
    Exhausted { attempts: u32, source: E },

    /// The operation failed with a non-retryable error
    #[error("Operation failed with non-retryable error: {source:?}")]
    NonRetryable { attempts: u32, source: E },

    /// The retry strategy configuration is invalid
    #[error("Invalid retry configuration: {message}")]
    InvalidConfiguration { message: String },
}

/// Result type for retry operations
pub type RetryResult<T, E> = Result<T, RetryError<E>>;

/// Trait for determining whether an error should be retried
pub trait RetryPolicy<E> {
    /// Classify `error` raised by attempt `attempt` (0-based)
    fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision;
}

/// Decision for whether to retry an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the operation with the default backoff delay
    Retry,
    /// Retry, waiting at least this long (capped by the backoff's max delay)
    RetryAtLeast(Duration),
    /// Don't retry the operation
    Stop,
}

/// Exponential backoff: `initial_delay * base^attempt`, capped at `max_delay`
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialBackoff {
    pub initial_delay: Duration,
    pub base: f64,
    pub max_delay: Duration,
}

impl ExponentialBackoff {
    /// Doubling backoff starting at `initial_delay`
    #[must_use]
    pub const fn doubling(initial_delay: Duration, max_delay: Duration) -> Self {
        Self { initial_delay, base: 2.0, max_delay }
    }

    /// Calculate the delay after attempt `attempt` (0-based)
    #[must_use]
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let nanos = self.initial_delay.as_nanos() as f64 * self.base.powi(exponent);
        if !nanos.is_finite() || nanos >= self.max_delay.as_nanos() as f64 {
            self.max_delay
        } else {
            Duration::from_nanos(nanos.round() as u64)
        }
    }
}

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    pub backoff: ExponentialBackoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            backoff: ExponentialBackoff::doubling(Duration::from_secs(1), Duration::from_secs(30)),
        }
    }
}

impl RetryConfig {
    /// Create a configuration builder
    #[must_use]
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::new()
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// Returns `RetryError::InvalidConfiguration` for zero attempts or a
    /// non-positive exponential base.
    pub fn validate(&self) -> Result<(), RetryError<()>> {
        if self.max_attempts == 0 {
            return Err(RetryError::InvalidConfiguration {
                message: "max_attempts must be greater than 0".to_string(),
            });
        }

        if self.backoff.base <= 0.0 {
            return Err(RetryError::InvalidConfiguration {
                message: "exponential base must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Builder for RetryConfig with fluent API
#[derive(Debug, Default)]
pub struct RetryConfigBuilder {
    config: RetryConfig,
}

impl RetryConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self { config: RetryConfig::default() }
    }

    /// Allow `retries` retries after the first attempt
    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_attempts = retries.saturating_add(1);
        self
    }

    #[must_use]
    pub fn exponential_backoff(
        mut self,
        initial_delay: Duration,
        base: f64,
        max_delay: Duration,
    ) -> Self {
        self.config.backoff = ExponentialBackoff { initial_delay, base, max_delay };
        self
    }

    /// # Errors
    /// Returns `RetryError::InvalidConfiguration` if validation fails.
    pub fn build(self) -> Result<RetryConfig, RetryError<()>> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// The main retry executor
#[derive(Debug, Clone)]
pub struct RetryExecutor<P> {
    config: RetryConfig,
    policy: P,
}

impl<P> RetryExecutor<P> {
    /// Create a new retry executor with the given configuration and policy
    pub const fn new(config: RetryConfig, policy: P) -> Self {
        Self { config, policy }
    }

    /// Execute an operation with retry logic
    ///
    /// `operation` receives the 0-based attempt number.
    #[instrument(skip(self, operation), fields(max_attempts = self.config.max_attempts))]
    pub async fn execute<F, Fut, T, E>(&self, mut operation: F) -> RetryResult<T, E>
    where
        P: RetryPolicy<E>,
        E: fmt::Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            let attempts = attempt + 1;
            debug!("Executing operation (attempt {}/{})", attempts, max_attempts);

            let error = match operation(attempt).await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!("Operation succeeded after {} retries", attempt);
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            let delay = match self.policy.should_retry(&error, attempt) {
                RetryDecision::Stop => {
                    debug!(error = %error, "Retry policy determined not to retry");
                    return Err(RetryError::NonRetryable { attempts, source: error });
                }
                _ if attempts >= max_attempts => {
                    warn!(attempts, error = %error, "All retry attempts exhausted");
                    return Err(RetryError::Exhausted { attempts, source: error });
                }
                RetryDecision::Retry => self.config.backoff.calculate_delay(attempt),
                RetryDecision::RetryAtLeast(minimum) => self
                    .config
                    .backoff
                    .calculate_delay(attempt)
                    .max(minimum.min(self.config.backoff.max_delay)),
            };

            warn!(attempt = attempts, ?delay, error = %error, "Operation failed, retrying");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
