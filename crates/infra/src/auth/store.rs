//! Credential persistence across two trust levels
//!
//! Low-sensitivity credentials (the app token) live in general storage.
//! High-sensitivity credentials (user and refresh tokens) go to secure
//! storage, degrading to general storage when the secure backend fails.
//! Store operations never fail the caller: backend errors are logged and a
//! failed read resolves to "absent".
//!
//! Every [`CredentialStore::remove_all`] starts a new clear generation.
//! Tokens obtained over the network are written with
//! [`CredentialStore::save_if_current`], so an issuance that began before a
//! clear cannot write its result back afterwards.

use std::sync::Arc;

use parking_lot::Mutex;
use tollgate_common::storage::{FallbackBackend, MemoryBackend, SecretBackend};
use tollgate_domain::{CredentialKind, Sensitivity};
use tracing::{debug, warn};

/// Credential slots backed by general and secure storage
pub struct CredentialStore {
    general: Arc<dyn SecretBackend>,
    secure: Arc<dyn SecretBackend>,
    /// Clear generation; the lock also serializes every backend operation
    guard: Mutex<u64>,
}

impl CredentialStore {
    /// Create a store over `general` storage and an optional `secure` backend
    ///
    /// Without a secure backend, high-sensitivity credentials use general
    /// storage directly.
    pub fn new(general: Arc<dyn SecretBackend>, secure: Option<Arc<dyn SecretBackend>>) -> Self {
        let secure: Arc<dyn SecretBackend> = match secure {
            Some(primary) => Arc::new(FallbackBackend::new(primary, Arc::clone(&general))),
            None => Arc::clone(&general),
        };

        Self { general, secure, guard: Mutex::new(0) }
    }

    /// Volatile store holding everything in process memory
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()), None)
    }

    fn backend(&self, kind: CredentialKind) -> &dyn SecretBackend {
        match kind.sensitivity() {
            Sensitivity::Low => self.general.as_ref(),
            Sensitivity::High => self.secure.as_ref(),
        }
    }

    /// Read a credential; `None` when absent or unreadable
    pub fn get(&self, kind: CredentialKind) -> Option<String> {
        let _guard = self.guard.lock();
        match self.backend(kind).get(kind.slot()) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(err) => {
                warn!(slot = kind.slot(), error = %err, "credential read failed, treating as absent");
                None
            }
        }
    }

    /// Persist a credential
    pub fn save(&self, kind: CredentialKind, value: &str) {
        let _guard = self.guard.lock();
        self.save_locked(kind, value);
    }

    /// Current clear generation, to be passed to [`Self::save_if_current`]
    pub fn generation(&self) -> u64 {
        *self.guard.lock()
    }

    /// Persist `entries` unless [`Self::remove_all`] ran since `generation`
    ///
    /// Returns whether the entries were written.
    pub fn save_if_current(&self, generation: u64, entries: &[(CredentialKind, &str)]) -> bool {
        let guard = self.guard.lock();
        if *guard != generation {
            debug!(expected = generation, current = *guard, "credentials cleared, dropping write");
            return false;
        }
        for (kind, value) in entries {
            self.save_locked(*kind, value);
        }
        true
    }

    /// Remove a credential
    pub fn remove(&self, kind: CredentialKind) {
        let _guard = self.guard.lock();
        self.remove_locked(kind);
    }

    /// Remove every credential from every backend
    pub fn remove_all(&self) {
        let mut guard = self.guard.lock();
        *guard = guard.wrapping_add(1);
        for kind in CredentialKind::ALL {
            self.remove_locked(kind);
        }
        debug!("all credentials removed");
    }

    /// Whether a credential is currently stored
    pub fn contains(&self, kind: CredentialKind) -> bool {
        self.get(kind).is_some()
    }

    fn save_locked(&self, kind: CredentialKind, value: &str) {
        match self.backend(kind).set(kind.slot(), value) {
            Ok(()) => debug!(slot = kind.slot(), "credential saved"),
            Err(err) => warn!(slot = kind.slot(), error = %err, "credential save failed"),
        }
    }

    fn remove_locked(&self, kind: CredentialKind) {
        if let Err(err) = self.backend(kind).delete(kind.slot()) {
            warn!(slot = kind.slot(), error = %err, "credential removal failed");
        }
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("general", &self.general.name())
            .field("secure", &self.secure.name())
            .finish_non_exhaustive()
    }
}
