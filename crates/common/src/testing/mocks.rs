//! Mock implementations of common traits
//!
//! Provides mock objects for testing purposes.

// Allow missing error/panic docs for test mocks - they are designed to be simple
// and errors are clearly indicated by their return types
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::storage::{SecretBackend, StorageError, StorageResult};

/// In-memory backend whose failures can be switched on at runtime
///
/// Stands in for a platform keychain that becomes locked or unreachable.
/// While failing, every operation returns `StorageError::AccessFailed` and
/// leaves the stored values untouched.
#[derive(Debug, Default)]
pub struct FlakyBackend {
    entries: Mutex<HashMap<String, String>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl FlakyBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle failure mode
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn is_failing(&self) -> bool {
        self.failing.load(Ordering::SeqCst)
    }

    /// Number of backend operations attempted, failed ones included
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Peek at a stored value regardless of failure mode
    pub fn peek(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn check(&self, op: &str) -> StorageResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.is_failing() {
            return Err(StorageError::AccessFailed(format!("{op} refused: backend locked")));
        }
        Ok(())
    }
}

impl SecretBackend for FlakyBackend {
    fn name(&self) -> &str {
        "flaky"
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.check("get")?;
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.check("set")?;
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        self.check("delete")?;
        self.entries.lock().remove(key);
        Ok(())
    }
}
