//! Platform keychain secret backend
//!
//! Thin wrapper over the platform keychain (macOS Keychain Access, Windows
//! Credential Manager, Linux kernel keyring) for storing credentials by
//! logical key under one service name.
//!
//! ## Usage
//!
//! ```no_run
//! use tollgate_common::security::KeychainBackend;
//! use tollgate_common::storage::SecretBackend;
//!
//! let keychain = KeychainBackend::new("tollgate");
//! keychain.set("user_token", "eyJ...")?;
//! assert_eq!(keychain.get("user_token")?.as_deref(), Some("eyJ..."));
//! # Ok::<(), tollgate_common::storage::StorageError>(())
//! ```

use keyring::Entry;
use tracing::debug;

use crate::storage::{SecretBackend, StorageError, StorageResult};

/// Keychain-backed secret storage
#[derive(Debug, Clone)]
pub struct KeychainBackend {
    service_name: String,
}

impl KeychainBackend {
    /// Create a backend for a specific service
    ///
    /// # Arguments
    /// * `service_name` - Service identifier (e.g., "tollgate",
    ///   "tollgate.staging")
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { service_name: service_name.into() }
    }

    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Create a keychain entry for the given account
    ///
    /// # Errors
    /// Returns `StorageError::AccessFailed` if entry creation fails
    fn create_entry(&self, account: &str) -> StorageResult<Entry> {
        Entry::new(&self.service_name, account).map_err(|e| {
            StorageError::AccessFailed(format!("Failed to create keychain entry: {e}"))
        })
    }
}

fn map_keyring_error(action: &str, key: &str, err: keyring::Error) -> StorageError {
    match err {
        keyring::Error::PlatformFailure(_) | keyring::Error::NoStorageAccess(_) => {
            StorageError::AccessFailed(format!("Failed to {action} secret for {key}: {err}"))
        }
        other => StorageError::Unsupported(format!("Failed to {action} secret for {key}: {other}")),
    }
}

impl SecretBackend for KeychainBackend {
    fn name(&self) -> &str {
        "keychain"
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        debug!(service = %self.service_name, key = %key, "Retrieving secret from keychain");

        let entry = self.create_entry(key)?;
        match entry.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(map_keyring_error("retrieve", key, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        debug!(service = %self.service_name, key = %key, "Storing secret in keychain");

        let entry = self.create_entry(key)?;
        entry.set_password(value).map_err(|e| map_keyring_error("store", key, e))?;

        debug!(service = %self.service_name, key = %key, "Secret stored successfully");
        Ok(())
    }

    /// Idempotent: a missing entry is not an error
    fn delete(&self, key: &str) -> StorageResult<()> {
        debug!(service = %self.service_name, key = %key, "Deleting secret from keychain");

        let entry = self.create_entry(key)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(map_keyring_error("delete", key, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for security::keychain.
    //!
    //! Tests that touch the real platform keychain are ignored by default;
    //! run them with `--ignored` on a machine with an unlocked keychain.
    use super::*;

    /// Create a test service name to avoid conflicts with real keychain entries
    fn test_service_name() -> String {
        format!("TollgateTest.{}", uuid::Uuid::new_v4())
    }

    #[test]
    fn test_keychain_backend_creation() {
        let keychain = KeychainBackend::new("test-service");
        assert_eq!(keychain.service_name(), "test-service");
        assert_eq!(keychain.name(), "keychain");
    }

    #[test]
    fn test_rejected_input_maps_to_unsupported() {
        let err = map_keyring_error("retrieve", "k", keyring::Error::TooLong("user".into(), 10));
        assert!(matches!(err, StorageError::Unsupported(_)));
    }

    #[test]
    #[ignore = "requires an unlocked platform keychain"]
    fn test_set_get_and_delete_secret() {
        let keychain = KeychainBackend::new(test_service_name());

        keychain.set("test.secret", "super-secret").unwrap();
        assert_eq!(keychain.get("test.secret").unwrap().as_deref(), Some("super-secret"));

        keychain.delete("test.secret").unwrap();
        assert_eq!(keychain.get("test.secret").unwrap(), None);
    }

    #[test]
    #[ignore = "requires an unlocked platform keychain"]
    fn test_delete_secret_idempotent() {
        let keychain = KeychainBackend::new(test_service_name());
        keychain.delete("never.stored").unwrap();
        keychain.delete("never.stored").unwrap();
    }
}
