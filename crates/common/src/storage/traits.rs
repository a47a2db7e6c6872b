//! Secret backend abstraction

use super::error::StorageResult;

/// Key/value storage for string secrets
///
/// Implementations must be safe to share across tasks. Operations are
/// synchronous; every backend in this crate completes without awaiting.
pub trait SecretBackend: Send + Sync {
    /// Short backend name used in logs
    fn name(&self) -> &str;

    /// Read a secret; `Ok(None)` when the key is absent
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write a secret, replacing any previous value
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Delete a secret; deleting an absent key succeeds
    fn delete(&self, key: &str) -> StorageResult<()>;
}

impl<T: SecretBackend + ?Sized> SecretBackend for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        (**self).delete(key)
    }
}
