//! Session management core module.
//!
//! This module provides the client-side session record, the key-value store
//! abstraction the session is persisted through, and the `SessionState` handle
//! the token guard and the API client share.

use serde::{Deserialize, Serialize};

/// Submodule for the JSON-file backed store.
pub mod file_store;
/// Submodule for the session record.
pub mod session;
/// Submodule for the store trait, the in-memory store and `SessionState`.
pub mod session_store;

pub use file_store::FileSessionStore;
pub use session::Session;
pub use session_store::{MemorySessionStore, SessionState, SessionStore};

/// Store key holding the bearer token.
pub const TOKEN_KEY: &str = "token";
/// Store key holding the JSON-encoded user record.
pub const USER_INFO_KEY: &str = "userInfo";
/// Store key holding the role name.
pub const USER_ROLE_KEY: &str = "userRole";

/// Snapshot of what the session store currently holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthStatus {
    pub has_token: bool,
    pub has_user_info: bool,
    pub has_user_role: bool,
    pub is_admin: bool,
    pub is_expiring_soon: bool,
}
