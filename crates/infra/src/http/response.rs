//! Response normalization into [`ApiResponseEnvelope`]

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, RETRY_AFTER};
use reqwest::Response;
use serde_json::Value;
use tollgate_domain::ApiResponseEnvelope;

use crate::api::errors::ApiError;

/// Read a response body and normalize it
///
/// Success bodies become an envelope (JSON that already is one is taken
/// verbatim; other JSON and text bodies are wrapped). Non-success statuses
/// become [`ApiError::Api`] carrying the server message and raw payload.
pub async fn read_envelope(response: Response) -> Result<ApiResponseEnvelope<Value>, ApiError> {
    let status = response.status();
    let retry_after = parse_retry_after(response.headers().get(RETRY_AFTER));
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.to_ascii_lowercase().contains("json"));

    let text = response
        .text()
        .await
        .map_err(|err| ApiError::Network(format!("failed to read response body: {err}")))?;

    let body = parse_body(&text, is_json);

    if status.is_success() {
        return match body {
            Ok(value) => Ok(ApiResponseEnvelope::from_json_body(status.as_u16(), value)),
            Err(err) => Err(ApiError::Decode(err)),
        };
    }

    let data = body.ok().filter(|value| !value.is_null());
    let message = data
        .as_ref()
        .and_then(|value| value.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| Some(text.trim().to_string()).filter(|t| !t.is_empty() && !is_json))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());

    Err(ApiError::from_status(status.as_u16(), message, data).with_retry_after(retry_after))
}

fn parse_body(text: &str, is_json: bool) -> Result<Value, String> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    if is_json {
        serde_json::from_str(text).map_err(|err| format!("invalid JSON body: {err}"))
    } else {
        Ok(Value::String(text.to_string()))
    }
}

/// Retry-After in delta-seconds form; HTTP dates are ignored
fn parse_retry_after(value: Option<&reqwest::header::HeaderValue>) -> Option<Duration> {
    value?.to_str().ok()?.trim().parse::<u64>().ok().map(Duration::from_secs)
}
