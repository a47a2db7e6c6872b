//! Token issuing backends
//!
//! [`HttpTokenIssuer`] talks to the credential-issuing endpoints;
//! [`MockTokenIssuer`] synthesizes tokens locally for mock mode.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Method;
use serde_json::Value;
use tollgate_domain::{AppTokenRequest, AuthTokens, EndpointConfig};
use tracing::{debug, instrument};

use crate::api::errors::ApiError;
use crate::api::mock::{mock_app_token, mock_user_token};
use crate::connectivity::ConnectivityProbe;
use crate::http::HttpClient;

/// Lifetime of locally synthesized user tokens
pub const MOCK_TOKEN_TTL: Duration = Duration::from_secs(3600);

/// Issues app tokens and refreshes user tokens
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    /// Exchange the client key for an app token
    async fn issue_app_token(&self, client_key: &str) -> Result<String, ApiError>;

    /// Exchange a refresh token for a new user token
    ///
    /// `refresh_token` is set when the server rotated it.
    async fn refresh_user_token(&self, refresh_token: &str) -> Result<AuthTokens, ApiError>;
}

/// Issues tokens against the live backend
///
/// Each call is a single timed attempt. Credential-issuing calls bypass the
/// request pipeline so they can never recurse into the refresh path.
pub struct HttpTokenIssuer {
    http: HttpClient,
    base_url: String,
    endpoints: EndpointConfig,
    timeout: Duration,
    connectivity: Arc<dyn ConnectivityProbe>,
}

impl HttpTokenIssuer {
    pub fn new(
        http: HttpClient,
        base_url: impl Into<String>,
        endpoints: EndpointConfig,
        timeout: Duration,
        connectivity: Arc<dyn ConnectivityProbe>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            endpoints,
            timeout,
            connectivity,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn ensure_online(&self) -> Result<(), ApiError> {
        if self.connectivity.is_online().await {
            Ok(())
        } else {
            Err(ApiError::Network("no network connection".to_string()))
        }
    }
}

#[async_trait]
impl TokenIssuer for HttpTokenIssuer {
    #[instrument(skip(self, client_key))]
    async fn issue_app_token(&self, client_key: &str) -> Result<String, ApiError> {
        self.ensure_online().await?;

        let body = AppTokenRequest { client_key: client_key.to_string() };
        let builder = self
            .http
            .request(Method::POST, self.url(&self.endpoints.app_token))
            .header(ACCEPT, "application/json")
            .json(&body);

        let envelope = self.http.fetch_envelope(builder, self.timeout).await?;
        debug!(status = envelope.status_code, "app token issued");
        extract_jwt(envelope.data.as_ref())
    }

    #[instrument(skip(self, refresh_token))]
    async fn refresh_user_token(&self, refresh_token: &str) -> Result<AuthTokens, ApiError> {
        self.ensure_online().await?;

        // The refresh token is the raw header value, without a Bearer prefix.
        let builder = self
            .http
            .request(Method::POST, self.url(&self.endpoints.refresh))
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, refresh_token);

        let envelope = self.http.fetch_envelope(builder, self.timeout).await?;
        debug!(status = envelope.status_code, "user token refreshed");
        extract_tokens(envelope.data.as_ref())
    }
}

/// Read `data.jwtToken` from a token endpoint payload
pub fn extract_jwt(data: Option<&Value>) -> Result<String, ApiError> {
    data.and_then(|data| data.get("jwtToken"))
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::Decode("response is missing data.jwtToken".to_string()))
}

/// Read `data.jwtToken` and an optional rotated `data.refreshToken`
pub fn extract_tokens(data: Option<&Value>) -> Result<AuthTokens, ApiError> {
    let jwt_token = extract_jwt(data)?;
    let refresh_token = data
        .and_then(|data| data.get("refreshToken"))
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(str::to_string);
    Ok(AuthTokens { jwt_token, refresh_token })
}

/// Issues tokens without any network access
#[derive(Debug, Clone)]
pub struct MockTokenIssuer {
    delay: Duration,
}

impl MockTokenIssuer {
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl TokenIssuer for MockTokenIssuer {
    async fn issue_app_token(&self, client_key: &str) -> Result<String, ApiError> {
        tokio::time::sleep(self.delay).await;
        Ok(mock_app_token(client_key))
    }

    async fn refresh_user_token(&self, _refresh_token: &str) -> Result<AuthTokens, ApiError> {
        tokio::time::sleep(self.delay).await;
        Ok(AuthTokens { jwt_token: mock_user_token("mock-user", MOCK_TOKEN_TTL), refresh_token: None })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::connectivity::{AlwaysOnline, StaticConnectivity};

    fn issuer(server: &MockServer, connectivity: Arc<dyn ConnectivityProbe>) -> HttpTokenIssuer {
        HttpTokenIssuer::new(
            HttpClient::new().unwrap(),
            server.uri(),
            EndpointConfig::default(),
            Duration::from_secs(5),
            connectivity,
        )
    }

    #[tokio::test]
    async fn app_token_request_sends_client_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/apptoken"))
            .and(body_json(json!({ "clientKey": "key-123" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "statusCode": 200,
                "success": true,
                "message": "",
                "data": { "jwtToken": "app-token" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = issuer(&server, Arc::new(AlwaysOnline)).issue_app_token("key-123").await;
        assert_eq!(token.unwrap(), "app-token");
    }

    #[tokio::test]
    async fn refresh_presents_raw_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/refresh"))
            .and(header("Authorization", "refresh-abc"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": { "jwtToken": "new-jwt" } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let tokens = issuer(&server, Arc::new(AlwaysOnline)).refresh_user_token("refresh-abc").await;
        let tokens = tokens.unwrap();
        assert_eq!(tokens.jwt_token, "new-jwt");
        assert_eq!(tokens.refresh_token, None);
    }

    #[tokio::test]
    async fn refresh_returns_rotated_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": { "jwtToken": "new-jwt", "refreshToken": "refresh-2" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tokens = issuer(&server, Arc::new(AlwaysOnline)).refresh_user_token("refresh-1").await;
        assert_eq!(tokens.unwrap().refresh_token.as_deref(), Some("refresh-2"));
    }

    #[tokio::test]
    async fn missing_token_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": {} })))
            .mount(&server)
            .await;

        let result = issuer(&server, Arc::new(AlwaysOnline)).issue_app_token("k").await;
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }

    #[tokio::test]
    async fn rejection_surfaces_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let err = issuer(&server, Arc::new(AlwaysOnline)).refresh_user_token("r").await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert!(err.is_auth_rejection());
    }

    #[tokio::test]
    async fn offline_issuer_makes_no_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let result =
            issuer(&server, Arc::new(StaticConnectivity::new(false))).issue_app_token("k").await;
        assert!(matches!(result, Err(ApiError::Network(_))));
    }

    #[tokio::test]
    async fn mock_issuer_is_deterministic_for_app_tokens() {
        let issuer = MockTokenIssuer::new(Duration::ZERO);
        let first = issuer.issue_app_token("key").await.unwrap();
        let second = issuer.issue_app_token("key").await.unwrap();
        assert_eq!(first, second);
        assert!(!issuer.refresh_user_token("r").await.unwrap().jwt_token.is_empty());
    }
}
