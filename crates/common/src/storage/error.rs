//! Storage error types
//!
//! Errors raised by secret backends. Callers above the backend layer
//! decide whether a failure is fatal; the credential store treats most of
//! them as "credential absent".

use thiserror::Error;

/// Storage error type
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend could not be reached (locked keychain, denied access, ...)
    #[error("Storage access failed: {0}")]
    AccessFailed(String),

    /// Backend is not available on this platform
    #[error("Storage backend unsupported: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Storage result type
pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    /// Whether retrying the same operation later might succeed
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::AccessFailed(_) | Self::Io(_))
    }
}
