//! Reading and minting JWT-shaped bearer tokens.
//!
//! Only the payload segment is ever inspected: the client never holds the
//! signing key, so it can only ask "when does this expire". The mock server
//! mints unsigned tokens with the same layout.

use std::sync::OnceLock;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use log::debug;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

const UNSIGNED_HEADER: &str = r#"{"alg":"none","typ":"JWT"}"#;
const MOCK_SIGNATURE: &str = "mock";

fn token_shape() -> &'static Regex {
    static SHAPE: OnceLock<Regex> = OnceLock::new();
    SHAPE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_\-+/]+=*\.[A-Za-z0-9_\-+/]+=*\.[A-Za-z0-9_\-+/=]*$")
            .expect("token shape pattern is valid")
    })
}

/// Payload claims of a bearer token. Every claim is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Expiry, seconds since the epoch.
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub exp: Option<i64>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().map_or(true, |exp| exp <= now)
    }
}

// `exp` shows up as an integer from most issuers and as a float from some.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64))))
}

/// Decodes the payload segment of `token`.
///
/// Accepts the URL-safe and the standard base64 alphabets, padded or not.
/// Returns `None` for anything that is not a three-segment token with a JSON
/// object payload.
pub fn decode_claims(token: &str) -> Option<TokenClaims> {
    if !token_shape().is_match(token) {
        debug!("Token does not have three base64 segments");
        return None;
    }
    let payload = token.split('.').nth(1)?;
    let normalized: String = payload
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    let bytes = URL_SAFE_NO_PAD
        .decode(normalized.as_bytes())
        .map_err(|e| debug!("Token payload is not base64: {}", e))
        .ok()?;
    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| debug!("Token payload is not JSON: {}", e))
        .ok()?;
    if !value.is_object() {
        return None;
    }
    serde_json::from_value(value).ok()
}

/// True when `token` is absent, unreadable, has no expiry, or expires less than
/// `window` after `now`. Any doubt resolves toward "refresh".
pub fn expires_within(token: Option<&str>, window: Duration, now: DateTime<Utc>) -> bool {
    // `expires_at` is `None` for timestamps chrono cannot represent.
    let Some(exp) = token.and_then(decode_claims).and_then(|c| c.expires_at()) else {
        return true;
    };
    exp.signed_duration_since(now) < window
}

/// Mints an unsigned `header.payload.signature` token carrying `claims`.
pub fn issue_unsigned(claims: &TokenClaims) -> String {
    let payload = serde_json::to_vec(claims).unwrap_or_else(|_| b"{}".to_vec());
    format!(
        "{}.{}.{}",
        URL_SAFE_NO_PAD.encode(UNSIGNED_HEADER),
        URL_SAFE_NO_PAD.encode(payload),
        MOCK_SIGNATURE
    )
}
