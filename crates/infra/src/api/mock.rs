//! Locally synthesized responses for mock mode
//!
//! Responses have the same envelope shape as the live backend. Token
//! endpoints return tokens the rest of the client can decode; identifiers
//! elsewhere are random per call.

use std::time::Duration;

use chrono::Utc;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tollgate_domain::constants::LOGOUT_PATH;
use tollgate_domain::{ApiResponseEnvelope, EndpointConfig, HttpMethod};
use uuid::Uuid;

use crate::auth::issuer::MOCK_TOKEN_TTL;
use crate::auth::jwt;

/// Deterministic app token for `client_key`
pub fn mock_app_token(client_key: &str) -> String {
    let digest = hex::encode(Sha256::digest(client_key.as_bytes()));
    format!("mock-app-{}", &digest[..16])
}

/// Unsigned JWT for `subject` expiring `ttl` from now
pub fn mock_user_token(subject: &str, ttl: Duration) -> String {
    let now = Utc::now().timestamp();
    let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
    jwt::encode_unsigned(&json!({
        "sub": subject,
        "iat": now,
        "exp": now.saturating_add(ttl),
    }))
}

pub fn mock_refresh_token() -> String {
    format!("mock-refresh-{}", Uuid::new_v4())
}

/// Maps `(method, path)` to a canned envelope
#[derive(Debug, Clone)]
pub struct MockResponseGenerator {
    endpoints: EndpointConfig,
    client_key: String,
}

impl MockResponseGenerator {
    pub fn new(endpoints: EndpointConfig, client_key: impl Into<String>) -> Self {
        Self { endpoints, client_key: client_key.into() }
    }

    /// Synthesize the response for `method` on `path`
    pub fn generate(&self, method: HttpMethod, path: &str) -> ApiResponseEnvelope<Value> {
        let path = normalize_path(path);

        let (message, data) = if path == normalize_path(&self.endpoints.app_token) {
            ("App token generated", json!({ "jwtToken": mock_app_token(&self.client_key) }))
        } else if path == normalize_path(&self.endpoints.login) {
            (
                "Login successful",
                json!({
                    "jwtToken": mock_user_token("mock-user", MOCK_TOKEN_TTL),
                    "refreshToken": mock_refresh_token(),
                }),
            )
        } else if path == normalize_path(&self.endpoints.refresh) {
            ("Token refreshed", json!({ "jwtToken": mock_user_token("mock-user", MOCK_TOKEN_TTL) }))
        } else if path == LOGOUT_PATH {
            ("Logged out", Value::Null)
        } else {
            match method {
                HttpMethod::Get if path.ends_with("/me") || path.ends_with("/profile") => (
                    "OK",
                    json!({
                        "id": Uuid::new_v4().to_string(),
                        "username": "mock-user",
                        "email": "mock-user@example.com",
                    }),
                ),
                HttpMethod::Get => ("OK", json!([])),
                HttpMethod::Delete => ("Deleted", Value::Null),
                _ => ("OK", json!({ "id": Uuid::new_v4().to_string() })),
            }
        };

        let data = if data.is_null() { None } else { Some(data) };
        ApiResponseEnvelope::ok(200, message, data)
    }
}

/// Path component only: no scheme, host, query or trailing slash
fn normalize_path(path: &str) -> String {
    let without_origin = match path.find("://") {
        Some(idx) => {
            let rest = &path[idx + 3..];
            rest.find('/').map_or("/", |slash| &rest[slash..])
        }
        None => path,
    };
    let without_query = without_origin.split(['?', '#']).next().unwrap_or_default();
    let trimmed = without_query.trim_end_matches('/');

    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
