//! Request pipeline
//!
//! [`LiveDispatch`] runs the full path for a request: connectivity gate,
//! credential resolution, timed HTTP exchange with bounded retry, and at
//! most one refresh-and-retry on 401. [`MockDispatch`] answers every request
//! locally. The client picks one of them once, from configuration.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::RequestBuilder;
use serde_json::Value;
use tollgate_common::resilience::{
    RetryConfig, RetryDecision, RetryError, RetryExecutor, RetryPolicy,
};
use tollgate_domain::constants::{AUTHORIZATION_HEADER, BEARER_PREFIX};
use tollgate_domain::{ApiResponseEnvelope, ClientConfig, RequestConfig, RetrySettings};
use tracing::{debug, info, instrument, warn};

use super::errors::ApiError;
use super::mock::MockResponseGenerator;
use crate::auth::{AppTokenManager, CredentialStore, UserTokenManager};
use crate::connectivity::ConnectivityProbe;
use crate::http::{method_for, HttpClient};

/// Executes a request and returns its envelope
#[async_trait]
pub trait Dispatch: Send + Sync {
    async fn dispatch(
        &self,
        request: &RequestConfig,
    ) -> Result<ApiResponseEnvelope<Value>, ApiError>;
}

/// Credential presented with a request
enum Credential {
    None,
    /// User token, sent as the raw header value
    User(String),
    /// App token, sent as a bearer credential
    App(String),
}

impl Credential {
    fn header_value(&self) -> Option<String> {
        match self {
            Self::None => None,
            Self::User(token) => Some(token.clone()),
            Self::App(token) => Some(format!("{BEARER_PREFIX}{token}")),
        }
    }
}

/// Retries transient failures, honouring a server Retry-After hint
#[derive(Debug, Clone, Copy)]
pub struct ApiRetryPolicy;

impl RetryPolicy<ApiError> for ApiRetryPolicy {
    fn should_retry(&self, error: &ApiError, _attempt: u32) -> RetryDecision {
        if !error.should_retry() {
            return RetryDecision::Stop;
        }
        error.retry_after().map_or(RetryDecision::Retry, RetryDecision::RetryAtLeast)
    }
}

/// Dispatch against the live backend
pub struct LiveDispatch {
    http: HttpClient,
    base_url: String,
    default_timeout: Duration,
    retry: RetrySettings,
    connectivity: Arc<dyn ConnectivityProbe>,
    store: Arc<CredentialStore>,
    app_tokens: Arc<AppTokenManager>,
    user_tokens: Arc<UserTokenManager>,
}

impl LiveDispatch {
    pub fn new(
        http: HttpClient,
        config: &ClientConfig,
        connectivity: Arc<dyn ConnectivityProbe>,
        store: Arc<CredentialStore>,
        app_tokens: Arc<AppTokenManager>,
        user_tokens: Arc<UserTokenManager>,
    ) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            default_timeout: config.timeout(),
            retry: config.retry.clone(),
            connectivity,
            store,
            app_tokens,
            user_tokens,
        }
    }

    /// User token for ordinary calls; app token for calls that skip only
    /// the user credential (login)
    async fn resolve_credential(&self, request: &RequestConfig) -> Result<Credential, ApiError> {
        if !request.skip_auth {
            return Ok(self.user_tokens.get_valid().await.map_or(Credential::None, Credential::User));
        }
        if !request.skip_app_token {
            return Ok(Credential::App(self.app_tokens.get().await?));
        }
        Ok(Credential::None)
    }

    /// One logical attempt: the HTTP exchange plus transient-failure retries
    async fn attempt(
        &self,
        request: &RequestConfig,
        credential: &Credential,
    ) -> Result<ApiResponseEnvelope<Value>, ApiError> {
        let timeout = request.timeout.unwrap_or(self.default_timeout);
        let retries = request.retries.unwrap_or(self.retry.max_retries);
        let config = RetryConfig::builder()
            .max_retries(retries)
            .exponential_backoff(self.retry.base_delay(), 2.0, self.retry.max_delay())
            .build()
            .map_err(|err| ApiError::Config(err.to_string()))?;

        let executor = RetryExecutor::new(config, ApiRetryPolicy);
        let url = join_url(&self.base_url, &request.path);
        let this = self;

        executor
            .execute(move |attempt| {
                let builder = this.build_request(&url, request, credential);
                async move {
                    debug!(attempt, "dispatching request");
                    this.http.fetch_envelope(builder, timeout).await
                }
            })
            .await
            .map_err(map_retry_error)
    }

    /// Refresh the user token once and replay the request with it
    ///
    /// A second 401 ends the exchange; there is no further refresh.
    async fn reauthenticate(
        &self,
        request: &RequestConfig,
    ) -> Result<ApiResponseEnvelope<Value>, ApiError> {
        let Some(token) = self.user_tokens.refresh().await else {
            warn!("session could not be refreshed, clearing credentials");
            self.store.remove_all();
            return Err(ApiError::Authentication("session expired".to_string()));
        };

        info!("retrying request with refreshed user token");
        match self.attempt(request, &Credential::User(token)).await {
            Err(err) if err.status() == Some(401) => {
                warn!("request rejected after refresh");
                Err(ApiError::Authentication("request rejected after token refresh".to_string()))
            }
            other => other,
        }
    }

    fn build_request(
        &self,
        url: &str,
        request: &RequestConfig,
        credential: &Credential,
    ) -> RequestBuilder {
        let mut builder =
            self.http.request(method_for(request.method), url).header(ACCEPT, "application/json");

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if !request.has_header(AUTHORIZATION_HEADER) {
            if let Some(value) = credential.header_value() {
                builder = builder.header(AUTHORIZATION, value);
            }
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        builder
    }
}

#[async_trait]
impl Dispatch for LiveDispatch {
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn dispatch(
        &self,
        request: &RequestConfig,
    ) -> Result<ApiResponseEnvelope<Value>, ApiError> {
        if is_absolute(&request.path) {
            return Err(ApiError::Config(format!(
                "request path must be relative to base_url: {}",
                request.path
            )));
        }

        if !self.connectivity.is_online().await {
            warn!("offline, request not sent");
            return Err(ApiError::Network("no network connection".to_string()));
        }

        let credential = self.resolve_credential(request).await?;

        match self.attempt(request, &credential).await {
            Err(err) if err.status() == Some(401) => {
                if matches!(credential, Credential::App(_)) {
                    self.app_tokens.invalidate();
                }
                if request.auth_eligible() {
                    self.reauthenticate(request).await
                } else {
                    Err(err)
                }
            }
            other => other,
        }
    }
}

/// Dispatch answered by the mock response generator
pub struct MockDispatch {
    generator: MockResponseGenerator,
    delay: Duration,
}

impl MockDispatch {
    pub const fn new(generator: MockResponseGenerator, delay: Duration) -> Self {
        Self { generator, delay }
    }
}

#[async_trait]
impl Dispatch for MockDispatch {
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn dispatch(
        &self,
        request: &RequestConfig,
    ) -> Result<ApiResponseEnvelope<Value>, ApiError> {
        tokio::time::sleep(self.delay).await;
        debug!("serving mock response");
        Ok(self.generator.generate(request.method, &request.path))
    }
}

fn map_retry_error(err: RetryError<ApiError>) -> ApiError {
    match err {
        RetryError::Exhausted { source, .. } | RetryError::NonRetryable { source, .. } => source,
        RetryError::InvalidConfiguration { message } => ApiError::Config(message),
    }
}

fn is_absolute(path: &str) -> bool {
    path.split(['?', '#']).next().is_some_and(|target| target.contains("://"))
}

/// Resolve `path` against `base_url`
fn join_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}
