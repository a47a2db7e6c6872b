//! User session token: expiry checks and single-flight refresh

use std::sync::Arc;

use chrono::Utc;
use tollgate_domain::CredentialKind;
use tracing::{debug, info, instrument, warn};

use super::issuer::TokenIssuer;
use super::jwt;
use super::single_flight::SingleFlight;
use super::store::CredentialStore;

/// Validates and refreshes the user token
pub struct UserTokenManager {
    store: Arc<CredentialStore>,
    issuer: Arc<dyn TokenIssuer>,
    leeway_secs: i64,
    in_flight: SingleFlight<Option<String>>,
}

impl UserTokenManager {
    pub fn new(store: Arc<CredentialStore>, issuer: Arc<dyn TokenIssuer>) -> Self {
        Self { store, issuer, leeway_secs: 0, in_flight: SingleFlight::new() }
    }

    /// Treat tokens expiring within `leeway_secs` as already expired
    #[must_use]
    pub fn with_leeway(mut self, leeway_secs: i64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }

    /// Whether `token` is past its expiry claim
    ///
    /// Tokens whose expiry cannot be decoded are reported as valid.
    pub fn is_expired(&self, token: &str) -> bool {
        jwt::is_expired(token, self.leeway_secs, Utc::now().timestamp())
    }

    /// Currently stored user token, without any expiry check
    pub fn current(&self) -> Option<String> {
        self.store.get(CredentialKind::UserToken)
    }

    /// A user token that is not expired, refreshing when necessary
    pub async fn get_valid(&self) -> Option<String> {
        let token = self.current()?;
        if self.is_expired(&token) {
            debug!("user token expired, refreshing");
            return self.refresh().await;
        }
        Some(token)
    }

    /// Persist the tokens of a fresh session
    pub fn store_session(&self, user_token: &str, refresh_token: Option<&str>) {
        self.store.save(CredentialKind::UserToken, user_token);
        if let Some(refresh_token) = refresh_token {
            self.store.save(CredentialKind::RefreshToken, refresh_token);
        }
    }

    /// Exchange the refresh token for a new user token
    ///
    /// Concurrent callers share one refresh. Returns `None` when no new token
    /// could be obtained; an authorization rejection also clears every stored
    /// credential, while transient failures keep them for a later attempt.
    /// A rotated refresh token is persisted with the new user token. Nothing
    /// is written when the credentials were cleared while the call was out.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Option<String> {
        let store = Arc::clone(&self.store);
        let issuer = Arc::clone(&self.issuer);

        self.in_flight
            .run(move || async move {
                let generation = store.generation();
                let Some(refresh_token) = store.get(CredentialKind::RefreshToken) else {
                    debug!("no refresh token stored");
                    return None;
                };

                match issuer.refresh_user_token(&refresh_token).await {
                    Ok(tokens) => {
                        let saved = {
                            let mut entries =
                                vec![(CredentialKind::UserToken, tokens.jwt_token.as_str())];
                            if let Some(rotated) = tokens.refresh_token.as_deref() {
                                entries.push((CredentialKind::RefreshToken, rotated));
                            }
                            store.save_if_current(generation, &entries)
                        };
                        if !saved {
                            warn!("credentials cleared during refresh, discarding new token");
                            return None;
                        }
                        info!(rotated = tokens.refresh_token.is_some(), "user token refreshed");
                        Some(tokens.jwt_token)
                    }
                    Err(err) if err.is_auth_rejection() => {
                        warn!(error = %err, "refresh rejected, clearing credentials");
                        store.remove_all();
                        None
                    }
                    Err(err) => {
                        warn!(error = %err, "refresh failed, keeping credentials");
                        None
                    }
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;
    use tollgate_domain::AuthTokens;

    use super::*;
    use crate::api::errors::ApiError;

    struct ScriptedIssuer {
        calls: AtomicU32,
        outcome: Result<String, ApiError>,
        rotated: Option<String>,
    }

    #[async_trait]
    impl TokenIssuer for ScriptedIssuer {
        async fn issue_app_token(&self, _client_key: &str) -> Result<String, ApiError> {
            Err(ApiError::Config("unused".into()))
        }

        async fn refresh_user_token(&self, _refresh_token: &str) -> Result<AuthTokens, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.outcome
                .clone()
                .map(|jwt_token| AuthTokens { jwt_token, refresh_token: self.rotated.clone() })
        }
    }

    fn token_with_exp(exp: i64) -> String {
        jwt::encode_unsigned(&json!({ "sub": "ada", "exp": exp }))
    }

    fn setup(
        outcome: Result<String, ApiError>,
    ) -> (UserTokenManager, Arc<ScriptedIssuer>, Arc<CredentialStore>) {
        let issuer = Arc::new(ScriptedIssuer { calls: AtomicU32::new(0), outcome, rotated: None });
        let store = Arc::new(CredentialStore::in_memory());
        (UserTokenManager::new(store.clone(), issuer.clone()), issuer, store)
    }

    #[tokio::test]
    async fn valid_token_is_returned_without_refresh() {
        let (manager, issuer, _store) = setup(Ok("new".into()));
        let token = token_with_exp(Utc::now().timestamp() + 600);
        manager.store_session(&token, Some("refresh"));

        assert_eq!(manager.get_valid().await, Some(token));
        assert_eq!(issuer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_token_is_absent() {
        let (manager, issuer, _store) = setup(Ok("new".into()));
        assert_eq!(manager.get_valid().await, None);
        assert_eq!(issuer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn expired_token_is_refreshed() {
        let (manager, issuer, store) = setup(Ok("fresh".into()));
        manager.store_session(&token_with_exp(1), Some("refresh"));

        assert_eq!(manager.get_valid().await.as_deref(), Some("fresh"));
        assert_eq!(issuer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.get(CredentialKind::UserToken).as_deref(), Some("fresh"));
        assert_eq!(store.get(CredentialKind::RefreshToken).as_deref(), Some("refresh"));
    }

    #[tokio::test]
    async fn opaque_token_is_never_refreshed() {
        let (manager, issuer, _store) = setup(Ok("fresh".into()));
        manager.store_session("opaque", Some("refresh"));

        assert_eq!(manager.get_valid().await.as_deref(), Some("opaque"));
        assert_eq!(issuer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn leeway_refreshes_tokens_about_to_expire() {
        let (manager, issuer, _store) = setup(Ok("fresh".into()));
        let manager = manager.with_leeway(120);
        manager.store_session(&token_with_exp(Utc::now().timestamp() + 60), Some("refresh"));

        assert_eq!(manager.get_valid().await.as_deref(), Some("fresh"));
        assert_eq!(issuer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_refreshes_share_one_call() {
        let (manager, issuer, _store) = setup(Ok("fresh".into()));
        manager.store_session(&token_with_exp(1), Some("refresh"));

        let results = futures::future::join_all((0..6).map(|_| manager.get_valid())).await;

        assert_eq!(issuer.calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|r| r.as_deref() == Some("fresh")));
    }

    #[tokio::test]
    async fn rejection_clears_every_credential() {
        let (manager, _issuer, store) = setup(Err(ApiError::from_status(401, "", None)));
        store.save(CredentialKind::AppToken, "app");
        manager.store_session(&token_with_exp(1), Some("refresh"));

        assert_eq!(manager.refresh().await, None);
        for kind in CredentialKind::ALL {
            assert!(!store.contains(kind));
        }
    }

    #[tokio::test]
    async fn transient_failure_keeps_credentials() {
        let (manager, _issuer, store) = setup(Err(ApiError::Timeout(Duration::from_secs(1))));
        manager.store_session(&token_with_exp(1), Some("refresh"));

        assert_eq!(manager.refresh().await, None);
        assert!(store.contains(CredentialKind::UserToken));
        assert!(store.contains(CredentialKind::RefreshToken));
    }

    #[tokio::test]
    async fn refresh_without_refresh_token_makes_no_call() {
        let (manager, issuer, _store) = setup(Ok("fresh".into()));
        manager.store_session(&token_with_exp(1), None);

        assert_eq!(manager.refresh().await, None);
        assert_eq!(issuer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rotated_refresh_token_is_persisted() {
        let issuer = Arc::new(ScriptedIssuer {
            calls: AtomicU32::new(0),
            outcome: Ok("fresh".into()),
            rotated: Some("refresh-2".into()),
        });
        let store = Arc::new(CredentialStore::in_memory());
        let manager = UserTokenManager::new(store.clone(), issuer);
        manager.store_session(&token_with_exp(1), Some("refresh-1"));

        assert_eq!(manager.refresh().await.as_deref(), Some("fresh"));
        assert_eq!(store.get(CredentialKind::RefreshToken).as_deref(), Some("refresh-2"));
    }

    #[tokio::test]
    async fn refresh_racing_a_clear_leaves_nothing_behind() {
        let (manager, issuer, store) = setup(Ok("fresh".into()));
        store.save(CredentialKind::AppToken, "app");
        manager.store_session(&token_with_exp(1), Some("refresh"));

        let (refreshed, ()) = tokio::join!(manager.refresh(), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            store.remove_all();
        });

        assert_eq!(issuer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(refreshed, None);
        for kind in CredentialKind::ALL {
            assert!(!store.contains(kind), "{kind:?} written back after remove_all");
        }
    }
}
