//! Minimal JWT payload inspection
//!
//! Signatures are never verified; the client only reads `exp` to decide
//! whether a refresh is due.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::{json, Value};

/// Expiry (`exp`, seconds since the epoch) of a JWT, if it can be read
pub fn decode_expiry(token: &str) -> Option<i64> {
    let mut parts = token.split('.');
    let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp")?;

    #[allow(clippy::cast_possible_truncation)]
    exp.as_i64().or_else(|| exp.as_f64().map(|secs| secs as i64))
}

/// Whether `token` expires within `leeway_secs` of `now`
///
/// Tokens without a readable expiry are treated as valid; the server
/// remains the authority and answers 401 when they are not.
pub fn is_expired(token: &str, leeway_secs: i64, now: i64) -> bool {
    decode_expiry(token).is_some_and(|exp| exp <= now.saturating_add(leeway_secs))
}

/// Encode `claims` as an unsigned (`alg: none`) JWT
pub fn encode_unsigned(claims: &Value) -> String {
    let header = json!({ "alg": "none", "typ": "JWT" });
    format!(
        "{}.{}.",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(claims.to_string())
    )
}
