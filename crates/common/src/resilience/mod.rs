//! Resilience patterns for fault tolerance and error handling
//!
//! Provides a generic retry executor with exponential backoff.
//! Callers supply a [`RetryPolicy`] that classifies their own error type;
//! the executor owns attempt counting, delays and logging.

pub mod retry;

// Re-export retry types
pub use retry::{
    ExponentialBackoff, RetryConfig, RetryConfigBuilder, RetryDecision, RetryError,
    RetryExecutor, RetryPolicy, RetryResult,
};
