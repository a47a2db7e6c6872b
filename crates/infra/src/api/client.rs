//! Tollgate client facade
//!
//! Wires storage, token managers and the request pipeline from a
//! [`ClientConfig`], and exposes typed request helpers plus the session
//! operations (login, logout, health).

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tollgate_common::security::KeychainBackend;
use tollgate_common::storage::{FileBackend, MemoryBackend, SecretBackend};
use tollgate_domain::constants::{HEALTH_CHECK_TIMEOUT_MS, HEALTH_PATH, LOGOUT_PATH};
use tollgate_domain::{
    ApiResponseEnvelope, AuthTokens, ClientConfig, CredentialKind, LoginRequest, RequestConfig,
};
use tracing::{debug, info, instrument, warn};

use super::errors::ApiError;
use super::mock::MockResponseGenerator;
use super::pipeline::{Dispatch, LiveDispatch, MockDispatch};
use crate::auth::{
    AppTokenManager, CredentialStore, HttpTokenIssuer, MockTokenIssuer, TokenIssuer,
    UserTokenManager,
};
use crate::connectivity::{ConnectivityProbe, TcpConnectivityProbe};
use crate::http::HttpClient;

/// Client for a backend guarded by app and user credentials
pub struct TollgateClient {
    config: ClientConfig,
    store: Arc<CredentialStore>,
    app_tokens: Arc<AppTokenManager>,
    user_tokens: Arc<UserTokenManager>,
    dispatcher: Arc<dyn Dispatch>,
}

impl TollgateClient {
    /// Build a client with default backends for `config`
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` if the configuration is invalid or the
    /// HTTP client cannot be created
    pub fn from_config(config: ClientConfig) -> Result<Self, ApiError> {
        Self::builder(config).build()
    }

    /// Create a builder for injecting storage, connectivity or issuer
    pub fn builder(config: ClientConfig) -> TollgateClientBuilder {
        TollgateClientBuilder::new(config)
    }

    /// Execute a request and decode its payload
    ///
    /// # Errors
    ///
    /// Returns the pipeline error, or `ApiError::Decode` when the payload
    /// does not match `T`
    pub async fn request<T: DeserializeOwned>(
        &self,
        request: RequestConfig,
    ) -> Result<ApiResponseEnvelope<T>, ApiError> {
        let envelope = self.dispatcher.dispatch(&request).await?;
        envelope.decode().map_err(|err| ApiError::Decode(err.to_string()))
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<ApiResponseEnvelope<T>, ApiError> {
        self.request(RequestConfig::get(path)).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<ApiResponseEnvelope<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(RequestConfig::post(path).with_json(body)?).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<ApiResponseEnvelope<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(RequestConfig::put(path).with_json(body)?).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<ApiResponseEnvelope<T>, ApiError> {
        self.request(RequestConfig::delete(path)).await
    }

    /// Authenticate and persist the session tokens
    ///
    /// The login call presents the app token rather than a user token.
    ///
    /// # Errors
    ///
    /// Returns the pipeline error, or `ApiError::Decode` when the response
    /// carries no user token
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let body = LoginRequest { username: username.to_string(), password: password.to_string() };
        let request = RequestConfig::post(&self.config.endpoints.login).skip_auth().with_json(&body)?;

        let envelope = self.dispatcher.dispatch(&request).await?;
        let data = envelope
            .data
            .ok_or_else(|| ApiError::Decode("login response has no data".to_string()))?;
        let tokens: AuthTokens =
            serde_json::from_value(data).map_err(|err| ApiError::Decode(err.to_string()))?;

        self.user_tokens.store_session(&tokens.jwt_token, tokens.refresh_token.as_deref());
        info!("logged in");
        Ok(())
    }

    /// Notify the backend (best effort) and remove every stored credential
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        if self.is_authenticated() {
            let request = RequestConfig::post(LOGOUT_PATH).with_retries(0);
            if let Err(err) = self.dispatcher.dispatch(&request).await {
                debug!(error = %err, "logout call failed, clearing credentials anyway");
            }
        }
        self.store.remove_all();
        info!("logged out");
    }

    /// Whether a user token is stored (it may still be expired)
    pub fn is_authenticated(&self) -> bool {
        self.store.contains(CredentialKind::UserToken)
    }

    /// Check that the backend answers its health endpoint
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> bool {
        let request = RequestConfig::get(HEALTH_PATH)
            .skip_app_token()
            .with_timeout(Duration::from_millis(HEALTH_CHECK_TIMEOUT_MS))
            .with_retries(0);

        match self.dispatcher.dispatch(&request).await {
            Ok(envelope) if envelope.success => {
                debug!("backend is healthy");
                true
            }
            Ok(envelope) => {
                warn!(status = envelope.status_code, "health check reported failure");
                false
            }
            Err(err) => {
                warn!(error = %err, "health check failed");
                false
            }
        }
    }

    /// Credential store, for inspecting or clearing authentication state
    pub fn credentials(&self) -> Arc<CredentialStore> {
        Arc::clone(&self.store)
    }

    pub fn app_tokens(&self) -> &AppTokenManager {
        &self.app_tokens
    }

    pub fn user_tokens(&self) -> &UserTokenManager {
        &self.user_tokens
    }

    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub const fn is_mock_mode(&self) -> bool {
        self.config.is_mock_mode()
    }
}

/// Builder for [`TollgateClient`]
pub struct TollgateClientBuilder {
    config: ClientConfig,
    general_backend: Option<Arc<dyn SecretBackend>>,
    secure_backend: Option<Arc<dyn SecretBackend>>,
    connectivity: Option<Arc<dyn ConnectivityProbe>>,
    issuer: Option<Arc<dyn TokenIssuer>>,
    http_client: Option<HttpClient>,
}

impl TollgateClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            general_backend: None,
            secure_backend: None,
            connectivity: None,
            issuer: None,
            http_client: None,
        }
    }

    /// Storage for low-sensitivity credentials and the secure fallback
    pub fn general_backend(mut self, backend: Arc<dyn SecretBackend>) -> Self {
        self.general_backend = Some(backend);
        self
    }

    /// Storage for high-sensitivity credentials
    pub fn secure_backend(mut self, backend: Arc<dyn SecretBackend>) -> Self {
        self.secure_backend = Some(backend);
        self
    }

    pub fn connectivity(mut self, probe: Arc<dyn ConnectivityProbe>) -> Self {
        self.connectivity = Some(probe);
        self
    }

    pub fn issuer(mut self, issuer: Arc<dyn TokenIssuer>) -> Self {
        self.issuer = Some(issuer);
        self
    }

    pub fn http_client(mut self, client: HttpClient) -> Self {
        self.http_client = Some(client);
        self
    }

    /// # Errors
    ///
    /// Returns `ApiError::Config` if the configuration is invalid or the
    /// HTTP client cannot be created
    pub fn build(self) -> Result<TollgateClient, ApiError> {
        let config = self.config;
        config.validate()?;

        let general: Arc<dyn SecretBackend> = match self.general_backend {
            Some(backend) => backend,
            None => match &config.storage.plain_store_path {
                Some(path) => Arc::new(FileBackend::new(path)),
                None => Arc::new(MemoryBackend::new()),
            },
        };
        let secure = self.secure_backend.or_else(|| {
            config.storage.use_keychain.then(|| {
                Arc::new(KeychainBackend::new(&config.storage.keychain_service))
                    as Arc<dyn SecretBackend>
            })
        });
        let store = Arc::new(CredentialStore::new(general, secure));

        let (issuer, live) = if config.is_mock_mode() {
            let issuer: Arc<dyn TokenIssuer> = match self.issuer {
                Some(issuer) => issuer,
                None => Arc::new(MockTokenIssuer::new(config.mock_delay())),
            };
            (issuer, None)
        } else {
            let http = match self.http_client {
                Some(http) => http,
                None => HttpClient::builder()
                    .timeout(config.timeout())
                    .user_agent(concat!("tollgate/", env!("CARGO_PKG_VERSION")))
                    .build()?,
            };
            let connectivity: Arc<dyn ConnectivityProbe> = match self.connectivity {
                Some(probe) => probe,
                None => Arc::new(TcpConnectivityProbe::for_base_url(
                    &config.base_url,
                    config.connectivity_timeout(),
                )?),
            };
            let issuer: Arc<dyn TokenIssuer> = match self.issuer {
                Some(issuer) => issuer,
                None => Arc::new(HttpTokenIssuer::new(
                    http.clone(),
                    config.base_url.clone(),
                    config.endpoints.clone(),
                    config.timeout(),
                    Arc::clone(&connectivity),
                )),
            };
            (issuer, Some((http, connectivity)))
        };

        let app_tokens = Arc::new(AppTokenManager::new(
            Arc::clone(&store),
            Arc::clone(&issuer),
            config.client_key.clone(),
        ));
        let user_tokens = Arc::new(
            UserTokenManager::new(Arc::clone(&store), issuer)
                .with_leeway(config.expiry_leeway_secs),
        );

        let dispatcher: Arc<dyn Dispatch> = match live {
            Some((http, connectivity)) => Arc::new(LiveDispatch::new(
                http,
                &config,
                connectivity,
                Arc::clone(&store),
                Arc::clone(&app_tokens),
                Arc::clone(&user_tokens),
            )),
            None => Arc::new(MockDispatch::new(
                MockResponseGenerator::new(config.endpoints.clone(), config.client_key.clone()),
                config.mock_delay(),
            )),
        };

        debug!(mock = config.is_mock_mode(), "tollgate client ready");
        Ok(TollgateClient { config, store, app_tokens, user_tokens, dispatcher })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_config() -> ClientConfig {
        let mut config = ClientConfig::mock("client-key");
        config.mock_delay_ms = 0;
        config.storage.use_keychain = false;
        config
    }

    #[test]
    fn invalid_config_is_rejected() {
        let result = TollgateClient::from_config(ClientConfig::new("", "key"));
        assert!(matches!(result, Err(ApiError::Config(_))));
    }

    #[tokio::test]
    async fn mock_login_and_logout() {
        let client = TollgateClient::from_config(mock_config()).unwrap();
        assert!(client.is_mock_mode());
        assert!(!client.is_authenticated());

        client.login("ada", "secret").await.unwrap();
        assert!(client.is_authenticated());
        assert!(client.credentials().contains(CredentialKind::RefreshToken));
        assert!(client.user_tokens().get_valid().await.is_some());

        client.logout().await;
        assert!(!client.is_authenticated());
        assert!(!client.credentials().contains(CredentialKind::RefreshToken));
    }

    #[tokio::test]
    async fn mock_health_check_passes() {
        let client = TollgateClient::from_config(mock_config()).unwrap();
        assert!(client.health_check().await);
    }

    #[tokio::test]
    async fn mock_app_token_is_persisted() {
        let client = TollgateClient::from_config(mock_config()).unwrap();
        let token = client.app_tokens().get().await.unwrap();

        assert_eq!(client.credentials().get(CredentialKind::AppToken), Some(token));
    }
}
