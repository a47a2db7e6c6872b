//! The canonical response envelope
//!
//! Every endpoint answers `{ statusCode, success, message, data }`, for
//! successful and structured-error responses alike. Bodies that do not follow
//! the shape are wrapped into it so callers never branch on content type.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `{ statusCode, success, message, data }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponseEnvelope<T> {
    pub status_code: u16,
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> ApiResponseEnvelope<T> {
    /// Successful envelope carrying `data`
    pub fn ok(status_code: u16, message: impl Into<String>, data: Option<T>) -> Self {
        Self { status_code, success: true, message: message.into(), data }
    }

    /// Consume the envelope and return its payload
    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

impl ApiResponseEnvelope<Value> {
    /// Wrap a body that does not follow the envelope shape
    ///
    /// `null` bodies become `data: None`.
    #[must_use]
    pub fn wrap(status_code: u16, body: Value) -> Self {
        let data = if body.is_null() { None } else { Some(body) };
        Self {
            status_code,
            success: (200..300).contains(&status_code),
            message: String::new(),
            data,
        }
    }

    /// Interpret a JSON body, wrapping it when it is not an envelope
    ///
    /// A body counts as an envelope when it is an object with a boolean
    /// `success` and at least one of `data`, `message` or `statusCode`.
    /// Missing `statusCode` falls back to the HTTP status.
    #[must_use]
    pub fn from_json_body(status_code: u16, body: Value) -> Self {
        match body {
            Value::Object(mut map)
                if map.get("success").is_some_and(Value::is_boolean)
                    && ["data", "message", "statusCode"].iter().any(|k| map.contains_key(*k)) =>
            {
                let success = map.get("success").and_then(Value::as_bool).unwrap_or(false);
                let status = map
                    .get("statusCode")
                    .and_then(Value::as_u64)
                    .and_then(|s| u16::try_from(s).ok())
                    .unwrap_or(status_code);
                let message = match map.remove("message") {
                    Some(Value::String(message)) => message,
                    _ => String::new(),
                };
                let data = map.remove("data").filter(|d| !d.is_null());
                Self { status_code: status, success, message, data }
            }
            other => Self::wrap(status_code, other),
        }
    }

    /// Deserialize the payload into a concrete type
    ///
    /// A missing payload deserializes from `null`, so `Option<_>` and `()`
    /// targets accept empty responses.
    ///
    /// # Errors
    /// Returns the serde error when the payload does not match `T`.
    pub fn decode<T: DeserializeOwned>(self) -> Result<ApiResponseEnvelope<T>, serde_json::Error> {
        let data = match self.data {
            Some(value) => Some(serde_json::from_value(value)?),
            None => serde_json::from_value::<Option<T>>(Value::Null)?,
        };
        Ok(ApiResponseEnvelope {
            status_code: self.status_code,
            success: self.success,
            message: self.message,
            data,
        })
    }
}
