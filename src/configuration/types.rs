use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 24 * 60 * 60;
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// `[server]` table: the mock resource server.
///
/// # Fields Overview
///
/// - `bind_address`: IP address the server listens on
/// - `port`: TCP port the server listens on
/// - `token_ttl_secs`: lifetime of the tokens handed out by login and refresh
/// - `seed_demo_users`: start with the admin, teacher and student demo accounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub token_ttl_secs: u64,
    pub seed_demo_users: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            seed_demo_users: true,
        }
    }
}

/// `[client]` table: how `ApiClient` reaches the backend.
///
/// # Fields Overview
///
/// - `base_url`: prefix of every request path, e.g. `http://localhost:8080/api`
/// - `timeout_secs`: per-request transport timeout
/// - `refresh_window_secs`: tokens expiring within this many seconds are refreshed
/// - `session_file`: where the session is persisted; in memory when absent
/// - `proactive_refresh`: refresh expiring tokens before sending, not only after a 401
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub refresh_window_secs: i64,
    pub session_file: Option<PathBuf>,
    pub proactive_refresh: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            refresh_window_secs: crate::token_management::DEFAULT_REFRESH_WINDOW_SECS,
            session_file: None,
            proactive_refresh: true,
        }
    }
}
