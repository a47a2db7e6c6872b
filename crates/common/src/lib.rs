//! Modular common utilities shared across Tollgate crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: secret storage traits, memory and file backends
//! - `runtime`: async infrastructure (retry executor, fallback storage)
//! - `platform`: platform integrations (keychain)
//! - `observability`: tracing (included by `runtime`)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod storage;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod resilience;

// Platform tier
// -------------------------------------------------------------------
#[cfg(feature = "platform")]
pub mod security;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "runtime", all(feature = "foundation", test)))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "runtime")]
pub use resilience::{
    ExponentialBackoff, RetryConfig, RetryConfigBuilder, RetryDecision, RetryError, RetryExecutor,
    RetryPolicy, RetryResult,
};
#[cfg(feature = "platform")]
pub use security::KeychainBackend;
#[cfg(feature = "observability")]
pub use storage::FallbackBackend;
#[cfg(feature = "foundation")]
pub use storage::{FileBackend, MemoryBackend, SecretBackend, StorageError, StorageResult};
