//! API-specific error types
//!
//! Provides error classification for API operations with retry metadata,
//! and the single mapping from errors to user-facing text.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tollgate_domain::TollgateError;

/// Categories of API errors for retry logic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// No connectivity or transport failure - fails fast
    Network,
    /// Call exceeded its timeout, or the server answered 408 - retryable
    Timeout,
    /// Session could not be restored - re-authentication required
    Authentication,
    /// 400 - non-retryable
    BadRequest,
    /// 401 on a call that was not eligible for refresh
    Unauthorized,
    /// 403 - non-retryable
    Forbidden,
    /// 404 - non-retryable
    NotFound,
    /// 429 - retryable with backoff
    RateLimit,
    /// 5xx - retryable
    Server,
    /// Other 4xx - non-retryable
    Client,
    /// Local misconfiguration - non-retryable
    Config,
    /// Response did not have the expected shape - non-retryable
    Decode,
}

/// API operation errors
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Non-success HTTP status with the server's message and raw payload
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String, data: Option<Value>, retry_after: Option<Duration> },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Error for a non-success HTTP status
    pub fn from_status(status: u16, message: impl Into<String>, data: Option<Value>) -> Self {
        Self::Api { status, message: message.into(), data, retry_after: None }
    }

    /// Attach a server-provided Retry-After hint
    #[must_use]
    pub fn with_retry_after(self, hint: Option<Duration>) -> Self {
        match self {
            Self::Api { status, message, data, .. } => {
                Self::Api { status, message, data, retry_after: hint }
            }
            other => other,
        }
    }

    /// Get the error category for this error
    pub const fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Network(_) => ApiErrorCategory::Network,
            Self::Timeout(_) => ApiErrorCategory::Timeout,
            Self::Authentication(_) => ApiErrorCategory::Authentication,
            Self::Config(_) => ApiErrorCategory::Config,
            Self::Decode(_) => ApiErrorCategory::Decode,
            Self::Api { status, .. } => match *status {
                400 => ApiErrorCategory::BadRequest,
                401 => ApiErrorCategory::Unauthorized,
                403 => ApiErrorCategory::Forbidden,
                404 => ApiErrorCategory::NotFound,
                408 => ApiErrorCategory::Timeout,
                429 => ApiErrorCategory::RateLimit,
                500..=599 => ApiErrorCategory::Server,
                _ => ApiErrorCategory::Client,
            },
        }
    }

    /// Check if this error should be retried
    ///
    /// Connectivity failures are not retried: they fail fast so the caller
    /// can tell the user to check their connection.
    pub const fn should_retry(&self) -> bool {
        matches!(
            self.category(),
            ApiErrorCategory::Timeout | ApiErrorCategory::RateLimit | ApiErrorCategory::Server
        )
    }

    /// Whether the backend rejected the presented credential
    pub const fn is_auth_rejection(&self) -> bool {
        matches!(
            self.category(),
            ApiErrorCategory::Authentication
                | ApiErrorCategory::Unauthorized
                | ApiErrorCategory::Forbidden
        )
    }

    /// HTTP status, when the error came from a response
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response payload, when the error came from a response
    pub const fn data(&self) -> Option<&Value> {
        match self {
            Self::Api { data, .. } => data.as_ref(),
            _ => None,
        }
    }

    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Api { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Text suitable for showing to the end user
    pub fn user_message(&self) -> String {
        let server_message = match self {
            Self::Api { message, .. } if !message.trim().is_empty() => Some(message.as_str()),
            _ => None,
        };

        match self.category() {
            ApiErrorCategory::Network => {
                "Please check your internet connection and try again.".to_string()
            }
            ApiErrorCategory::Timeout => "The request timed out. Please try again.".to_string(),
            ApiErrorCategory::Authentication => {
                "Your session has expired. Please log in again.".to_string()
            }
            ApiErrorCategory::BadRequest => server_message
                .unwrap_or("The request could not be processed.")
                .to_string(),
            ApiErrorCategory::Unauthorized => {
                server_message.unwrap_or("Authentication is required.").to_string()
            }
            ApiErrorCategory::Forbidden => {
                "You do not have permission to perform this action.".to_string()
            }
            ApiErrorCategory::NotFound => "The requested resource was not found.".to_string(),
            ApiErrorCategory::RateLimit => {
                "Too many requests. Please wait a moment and try again.".to_string()
            }
            ApiErrorCategory::Server => "Server error. Please try again later.".to_string(),
            ApiErrorCategory::Client => server_message.map_or_else(
                || format!("Request failed (status {}).", self.status().unwrap_or_default()),
                str::to_string,
            ),
            ApiErrorCategory::Config | ApiErrorCategory::Decode => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }
}

impl From<TollgateError> for ApiError {
    fn from(err: TollgateError) -> Self {
        match err {
            TollgateError::Network(message) => Self::Network(message),
            TollgateError::Auth(message) => Self::Authentication(message),
            TollgateError::Config(message)
            | TollgateError::Storage(message)
            | TollgateError::InvalidInput(message)
            | TollgateError::Internal(message) => Self::Config(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_status_categories() {
        let cases = [
            (400, ApiErrorCategory::BadRequest),
            (401, ApiErrorCategory::Unauthorized),
            (403, ApiErrorCategory::Forbidden),
            (404, ApiErrorCategory::NotFound),
            (408, ApiErrorCategory::Timeout),
            (409, ApiErrorCategory::Client),
            (429, ApiErrorCategory::RateLimit),
            (500, ApiErrorCategory::Server),
            (503, ApiErrorCategory::Server),
        ];

        for (status, category) in cases {
            assert_eq!(ApiError::from_status(status, "", None).category(), category, "{status}");
        }
    }

    #[test]
    fn test_should_retry() {
        assert!(ApiError::Timeout(Duration::from_secs(1)).should_retry());
        assert!(ApiError::from_status(408, "", None).should_retry());
        assert!(ApiError::from_status(429, "", None).should_retry());
        assert!(ApiError::from_status(502, "", None).should_retry());

        assert!(!ApiError::Network("offline".into()).should_retry());
        assert!(!ApiError::Authentication("expired".into()).should_retry());
        assert!(!ApiError::from_status(400, "", None).should_retry());
        assert!(!ApiError::from_status(401, "", None).should_retry());
        assert!(!ApiError::from_status(404, "", None).should_retry());
    }

    #[test]
    fn test_auth_rejection() {
        assert!(ApiError::from_status(401, "", None).is_auth_rejection());
        assert!(ApiError::from_status(403, "", None).is_auth_rejection());
        assert!(ApiError::Authentication("x".into()).is_auth_rejection());
        assert!(!ApiError::Timeout(Duration::from_secs(1)).is_auth_rejection());
        assert!(!ApiError::from_status(500, "", None).is_auth_rejection());
    }

    #[test]
    fn test_user_message_prefers_server_text_for_bad_request() {
        let err = ApiError::from_status(400, "Email is invalid", Some(json!({"field": "email"})));
        assert_eq!(err.user_message(), "Email is invalid");
        assert_eq!(err.data().unwrap()["field"], "email");

        let err = ApiError::from_status(400, "  ", None);
        assert_eq!(err.user_message(), "The request could not be processed.");
    }

    #[test]
    fn test_user_message_for_fixed_categories() {
        assert!(ApiError::Network("x".into()).user_message().contains("internet connection"));
        assert!(ApiError::from_status(408, "", None).user_message().contains("timed out"));
        assert!(ApiError::Authentication("x".into()).user_message().contains("log in"));
        assert!(ApiError::from_status(403, "nope", None).user_message().contains("permission"));
        assert!(ApiError::from_status(404, "", None).user_message().contains("not found"));
        assert!(ApiError::from_status(429, "", None).user_message().contains("Too many"));
        assert!(ApiError::from_status(500, "", None).user_message().contains("try again later"));
        assert_eq!(ApiError::from_status(418, "", None).user_message(), "Request failed (status 418).");
    }

    #[test]
    fn test_retry_after_only_applies_to_responses() {
        let hint = Some(Duration::from_secs(2));
        assert_eq!(ApiError::from_status(429, "", None).with_retry_after(hint).retry_after(), hint);
        assert_eq!(ApiError::Network("x".into()).with_retry_after(hint).retry_after(), None);
    }

    #[test]
    fn test_from_domain_error() {
        let err: ApiError = TollgateError::Network("down".into()).into();
        assert!(matches!(err, ApiError::Network(_)));

        let err: ApiError = TollgateError::InvalidInput("bad body".into()).into();
        assert_eq!(err.category(), ApiErrorCategory::Config);
    }
}
