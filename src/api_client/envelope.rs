//! The `{code, message, data, timestamp}` envelope every endpoint answers with,
//! and the single decoder the client runs every response body through.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data_validation::types::{Paged, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use crate::error_handling::types::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T = Value> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Only the login and refresh endpoints set this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl<T> Envelope<T> {
    pub fn new(code: i64, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            code,
            message: message.into(),
            data,
            timestamp: Some(Utc::now().to_rfc3339()),
            token: None,
        }
    }

    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::new(200, message, Some(data))
    }

    pub fn failure(code: i64, message: impl Into<String>) -> Self {
        Self::new(code, message, None)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }
}

impl Envelope<Value> {
    /// Decodes `data` as `T`. A missing `data` is read as JSON `null`, so `()`,
    /// `Option<_>` and `Value` targets accept it.
    pub fn into_data<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        serde_json::from_value(self.data.unwrap_or(Value::Null))
            .map_err(|e| ApiError::Decode(format!("unexpected `data` shape: {}", e)))
    }
}

/// Reads a response body into an envelope.
///
/// - an empty body is an empty success;
/// - a JSON object with a `code` member must be a well-formed envelope;
/// - any other JSON value is taken as an envelope-less payload;
/// - a body that is not JSON at all is rejected.
pub fn decode_envelope(body: &[u8]) -> Result<Envelope<Value>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Envelope {
            code: 200,
            message: String::new(),
            data: None,
            timestamp: None,
            token: None,
        });
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::Decode(format!("body is not JSON: {}", e)))?;

    match value {
        Value::Object(ref map) if map.contains_key("code") => serde_json::from_value(value)
            .map_err(|e| ApiError::Decode(format!("malformed envelope: {}", e))),
        payload => Ok(Envelope {
            code: 200,
            message: String::new(),
            data: Some(payload),
            timestamp: None,
            token: None,
        }),
    }
}

/// Best-effort human message for a failed response.
pub fn error_message(status: u16, body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("request failed with HTTP {}", status))
}

/// Typed form of the paginated `data` member.
#[derive(Debug, Clone, Deserialize)]
pub struct PageData<T> {
    #[serde(default = "Option::default")]
    pub list: Option<Vec<T>>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub size: Option<u32>,
}

impl<T> From<PageData<T>> for Paged<T> {
    fn from(data: PageData<T>) -> Self {
        Paged::new(
            data.list.unwrap_or_default(),
            data.total,
            data.page.unwrap_or(DEFAULT_PAGE),
            data.size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }
}

/// Server-side shape of the paginated `data` member.
#[derive(Debug, Clone, Serialize)]
pub struct PageBody<T> {
    pub list: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub size: u32,
    pub pages: u64,
}

impl<T> PageBody<T> {
    pub fn new(list: Vec<T>, total: u64, page: u32, size: u32) -> Self {
        let size = size.max(1);
        Self {
            list,
            total,
            page,
            size,
            pages: total.div_ceil(u64::from(size)),
        }
    }
}
