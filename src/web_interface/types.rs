use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use warp::http::StatusCode;
use warp::reply::{self, Reply, Response};

use crate::api_client::envelope::Envelope;
use crate::error_handling::types::DirectoryError;

/// Page size used by `GET /users` when none is given.
pub const DEFAULT_LIST_SIZE: u32 = 20;

/// Parsed query of `GET /users`. Unparseable or zero numbers fall back to the
/// defaults; empty strings mean "no filter".
#[derive(Debug, Clone, PartialEq)]
pub struct ListParams {
    pub page: u32,
    pub size: u32,
    pub search: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
}

impl ListParams {
    pub fn from_query(query: &HashMap<String, String>) -> Self {
        let number = |key: &str, default: u32| {
            query
                .get(key)
                .and_then(|v| v.trim().parse::<u32>().ok())
                .filter(|n| *n >= 1)
                .unwrap_or(default)
        };
        let text = |key: &str| query.get(key).filter(|v| !v.is_empty()).cloned();

        Self {
            page: number("page", 1),
            size: number("size", DEFAULT_LIST_SIZE),
            search: text("search"),
            role: text("role"),
            status: text("status"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusRequest {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDeleteRequest {
    #[serde(default)]
    pub user_ids: Option<Value>,
}

/// Serializes `envelope` with the given HTTP status.
pub fn envelope_reply<T: Serialize>(status: StatusCode, envelope: &Envelope<T>) -> Response {
    reply::with_status(reply::json(envelope), status).into_response()
}

/// `200` envelope carrying `data`.
pub fn success<T: Serialize>(message: &str, data: T) -> Response {
    envelope_reply(StatusCode::OK, &Envelope::ok(message, data))
}

/// Envelope with `code == status` and no data.
pub fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    envelope_reply(
        status,
        &Envelope::<Value>::failure(i64::from(status.as_u16()), message),
    )
}

/// Envelope for a refused directory operation, at the error's own status.
pub fn refusal(err: &DirectoryError) -> Response {
    let status = StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    failure(status, err.to_string())
}
