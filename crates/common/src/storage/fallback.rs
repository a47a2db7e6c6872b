//! Primary/fallback backend composition
//!
//! Used for high-sensitivity credentials: the secure backend is primary and
//! general-purpose storage catches writes the secure backend refuses. At most
//! one live copy exists; a successful primary write removes the fallback copy
//! so a later primary outage cannot resurrect a stale value.

use tracing::{debug, warn};

use super::error::StorageResult;
use super::traits::SecretBackend;

/// Reads and writes go to `primary`, degrading to `fallback` on failure
pub struct FallbackBackend<P, F> {
    primary: P,
    fallback: F,
}

impl<P: SecretBackend, F: SecretBackend> FallbackBackend<P, F> {
    pub const fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }

    pub const fn primary(&self) -> &P {
        &self.primary
    }

    pub const fn fallback(&self) -> &F {
        &self.fallback
    }
}

impl<P: SecretBackend, F: SecretBackend> SecretBackend for FallbackBackend<P, F> {
    fn name(&self) -> &str {
        self.primary.name()
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        match self.primary.get(key) {
            Ok(Some(value)) => Ok(Some(value)),
            Ok(None) => self.fallback.get(key),
            Err(primary_err) => {
                warn!(
                    backend = self.primary.name(),
                    key,
                    error = %primary_err,
                    "Primary read failed, trying fallback"
                );
                self.fallback.get(key).map_err(|fallback_err| {
                    debug!(key, error = %fallback_err, "Fallback read failed");
                    primary_err
                })
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        match self.primary.set(key, value) {
            Ok(()) => {
                if let Err(err) = self.fallback.delete(key) {
                    debug!(key, error = %err, "Could not clear fallback copy");
                }
                Ok(())
            }
            Err(err) => {
                warn!(
                    backend = self.primary.name(),
                    fallback = self.fallback.name(),
                    key,
                    error = %err,
                    "Primary write failed, storing in fallback"
                );
                self.fallback.set(key, value)
            }
        }
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        let primary = self.primary.delete(key);
        let fallback = self.fallback.delete(key);

        match (primary, fallback) {
            (Err(err), Err(_)) => Err(err),
            (Err(err), Ok(())) => {
                warn!(backend = self.primary.name(), key, error = %err, "Primary delete failed");
                Ok(())
            }
            (Ok(()), Err(err)) => {
                warn!(backend = self.fallback.name(), key, error = %err, "Fallback delete failed");
                Ok(())
            }
            (Ok(()), Ok(())) => Ok(()),
        }
    }
}
