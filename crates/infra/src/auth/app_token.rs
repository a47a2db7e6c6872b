//! Application identity token

use std::sync::Arc;

use tollgate_domain::CredentialKind;
use tracing::{debug, instrument, warn};

use super::issuer::TokenIssuer;
use super::single_flight::SingleFlight;
use super::store::CredentialStore;
use crate::api::errors::ApiError;

/// Obtains and caches the app token
///
/// Concurrent generation requests share one issuer call.
pub struct AppTokenManager {
    store: Arc<CredentialStore>,
    issuer: Arc<dyn TokenIssuer>,
    client_key: String,
    in_flight: SingleFlight<Result<String, ApiError>>,
}

impl AppTokenManager {
    pub fn new(
        store: Arc<CredentialStore>,
        issuer: Arc<dyn TokenIssuer>,
        client_key: impl Into<String>,
    ) -> Self {
        Self { store, issuer, client_key: client_key.into(), in_flight: SingleFlight::new() }
    }

    /// Cached app token, generating one when absent
    pub async fn get(&self) -> Result<String, ApiError> {
        if let Some(token) = self.store.get(CredentialKind::AppToken) {
            return Ok(token);
        }
        self.generate().await
    }

    /// Generate a new app token, joining a generation already in progress
    ///
    /// On failure every waiter receives the same error and no app token is
    /// left cached. A token issued across a credential clear is returned to
    /// the waiters but not persisted.
    #[instrument(skip(self))]
    pub async fn generate(&self) -> Result<String, ApiError> {
        let store = Arc::clone(&self.store);
        let issuer = Arc::clone(&self.issuer);
        let client_key = self.client_key.clone();

        self.in_flight
            .run(move || async move {
                let generation = store.generation();
                match issuer.issue_app_token(&client_key).await {
                    Ok(token) => {
                        if store.save_if_current(generation, &[(CredentialKind::AppToken, &token)]) {
                            debug!("app token generated");
                        }
                        Ok(token)
                    }
                    Err(err) => {
                        store.remove(CredentialKind::AppToken);
                        warn!(error = %err, "app token generation failed");
                        Err(err)
                    }
                }
            })
            .await
    }

    /// Drop the cached app token so the next call generates a fresh one
    pub fn invalidate(&self) {
        self.store.remove(CredentialKind::AppToken);
    }
}
