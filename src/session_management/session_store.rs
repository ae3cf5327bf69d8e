//! Session Store
//!
//! The client keeps its token, user record and role in a small key-value store
//! under fixed keys. `SessionStore` is that store; `SessionState` is the typed
//! handle every other component goes through.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, info, warn};
use serde_json::Value;

use super::{FileSessionStore, Session, TOKEN_KEY, USER_INFO_KEY, USER_ROLE_KEY};
use crate::configuration::types::ClientConfig;
use crate::error_handling::types::StorageError;
use crate::models::Role;

/// Key-value persistence boundary for the client session.
///
/// Implementors only move strings; encoding is `SessionState`'s business.
pub trait SessionStore: Send + Sync {
    /// Reads the value stored under `key`, if any.
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Process-local store, lost on exit.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// Typed access to the session held by a `SessionStore`.
///
/// Shared by `Arc` between the token guard, the API client and the resource
/// wrappers. Writes are last-writer-wins.
#[derive(Clone)]
pub struct SessionState {
    store: Arc<dyn SessionStore>,
}

impl SessionState {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Convenience constructor over a fresh `MemorySessionStore`.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStore::new()))
    }

    /// File-backed when `session_file` is set, in memory otherwise.
    pub fn from_config(config: &ClientConfig) -> Result<Self, StorageError> {
        match &config.session_file {
            Some(path) => Ok(Self::new(Arc::new(FileSessionStore::new(path)?))),
            None => Ok(Self::in_memory()),
        }
    }

    /// The stored bearer token. Read failures are logged and read as "no token".
    pub fn token(&self) -> Option<String> {
        match self.store.load(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!("Unable to read token from session store: {}", e);
                None
            }
        }
    }

    pub fn set_token(&self, token: &str) -> Result<(), StorageError> {
        self.store.save(TOKEN_KEY, token)?;
        debug!("Stored refreshed token");
        Ok(())
    }

    pub fn role(&self) -> Option<Role> {
        self.store
            .load(USER_ROLE_KEY)
            .ok()
            .flatten()
            .and_then(|r| r.parse().ok())
    }

    /// The stored user record; a record that no longer parses reads as absent.
    pub fn user_info(&self) -> Option<Value> {
        let raw = self.store.load(USER_INFO_KEY).ok().flatten()?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Discarding unparseable user info: {}", e);
                None
            }
        }
    }

    /// The full session, when all three parts are present.
    pub fn current(&self) -> Option<Session> {
        Some(Session::new(self.token()?, self.role()?, self.user_info()?))
    }

    /// Replaces whatever is stored with `session`.
    pub fn begin(&self, session: &Session) -> Result<(), StorageError> {
        let user_info = serde_json::to_string(&session.user_info)
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        self.store.save(TOKEN_KEY, &session.token)?;
        self.store.save(USER_INFO_KEY, &user_info)?;
        self.store.save(USER_ROLE_KEY, session.role.as_str())?;
        info!("Session started for role {}", session.role);
        Ok(())
    }

    /// Drops token, user record and role. Idempotent; failures are logged only.
    pub fn clear(&self) {
        for key in [TOKEN_KEY, USER_INFO_KEY, USER_ROLE_KEY] {
            if let Err(e) = self.store.remove(key) {
                warn!("Unable to remove `{}` from session store: {}", key, e);
            }
        }
        debug!("Session state cleared");
    }

    pub(crate) fn has_user_info(&self) -> bool {
        matches!(self.store.load(USER_INFO_KEY), Ok(Some(_)))
    }

    pub(crate) fn has_role(&self) -> bool {
        matches!(self.store.load(USER_ROLE_KEY), Ok(Some(_)))
    }
}
