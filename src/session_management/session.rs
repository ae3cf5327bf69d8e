use crate::models::Role;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An authenticated client session.
///
/// Created on login and replaced wholesale afterwards; a refresh only swaps the
/// token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub role: Role,
    pub user_info: Value,
}

impl Session {
    pub fn new(token: impl Into<String>, role: Role, user_info: Value) -> Self {
        Self {
            token: token.into(),
            role,
            user_info,
        }
    }
}
