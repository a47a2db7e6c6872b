//! Authentication payloads exchanged with the backend

use serde::{Deserialize, Serialize};

/// Body of the app token request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppTokenRequest {
    pub client_key: String,
}

/// Credentials submitted to the login endpoint
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Token payload returned by the login, refresh and app token endpoints
///
/// Login always returns a refresh token; refresh returns one only when it
/// rotates it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    pub jwt_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for AuthTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthTokens")
            .field("jwt_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn app_token_request_uses_client_key_field() {
        let body = serde_json::to_value(AppTokenRequest { client_key: "k".into() }).unwrap();
        assert_eq!(body, json!({ "clientKey": "k" }));
    }

    #[test]
    fn auth_tokens_parse_with_and_without_refresh() {
        let login: AuthTokens =
            serde_json::from_value(json!({ "jwtToken": "a", "refreshToken": "r" })).unwrap();
        assert_eq!(login.refresh_token.as_deref(), Some("r"));

        let refresh: AuthTokens = serde_json::from_value(json!({ "jwtToken": "b" })).unwrap();
        assert!(refresh.refresh_token.is_none());
    }

    #[test]
    fn debug_output_hides_secrets() {
        let tokens = AuthTokens { jwt_token: "secret-jwt".into(), refresh_token: Some("r1".into()) };
        let login = LoginRequest { username: "ada".into(), password: "hunter2".into() };

        let rendered = format!("{tokens:?} {login:?}");
        assert!(!rendered.contains("secret-jwt"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("ada"));
    }
}
