use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{Duration, Utc};
use log::{debug, info, warn};
use tokio::sync::oneshot;

use super::claims::expires_within;
use crate::api_client::envelope::decode_envelope;
use crate::api_client::transport::{HttpRequest, Transport};
use crate::error_handling::types::ApiError;
use crate::models::Role;
use crate::session_management::{AuthStatus, SessionState};

/// Path of the token refresh endpoint, relative to the API base URL.
pub const REFRESH_PATH: &str = "/refresh-token";
/// How close to expiry a token may get before it is refreshed proactively.
pub const DEFAULT_REFRESH_WINDOW_SECS: i64 = 5 * 60;

type Waiter = oneshot::Sender<Result<String, ApiError>>;

enum RefreshState {
    Idle,
    Refreshing(Vec<Waiter>),
}

/// Keeps the stored bearer token usable and refreshes it at most once at a time.
///
/// # Fields Overview
///
/// - `transport`: where the refresh call is sent
/// - `session`: the stored token, replaced on success and cleared on failure
/// - `refresh_window`: a token expiring within this window counts as stale
/// - `state`: `Idle`, or `Refreshing` with the callers queued behind the
///   in-flight refresh
pub struct TokenGuard {
    transport: Arc<dyn Transport>,
    session: SessionState,
    refresh_window: Duration,
    state: Mutex<RefreshState>,
}

impl TokenGuard {
    pub fn new(transport: Arc<dyn Transport>, session: SessionState) -> Self {
        Self {
            transport,
            session,
            refresh_window: Duration::seconds(DEFAULT_REFRESH_WINDOW_SECS),
            state: Mutex::new(RefreshState::Idle),
        }
    }

    pub fn with_refresh_window(mut self, window: Duration) -> Self {
        self.refresh_window = window;
        self
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// True when `token` is missing, unreadable or expires within the refresh window.
    pub fn is_expiring_soon(&self, token: Option<&str>) -> bool {
        expires_within(token, self.refresh_window, Utc::now())
    }

    /// The stored token, refreshed first when it is expiring soon.
    pub async fn get_valid_token(&self) -> Result<String, ApiError> {
        match self.session.token() {
            Some(token) if !self.is_expiring_soon(Some(&token)) => Ok(token),
            _ => self.refresh().await,
        }
    }

    /// Obtains a new token from the server.
    ///
    /// Only the first caller sends the refresh request; callers arriving while it
    /// is outstanding wait for it and get the same outcome. Any failure clears the
    /// session and is reported as `AuthExpired`.
    pub async fn refresh(&self) -> Result<String, ApiError> {
        let queued = {
            let mut state = self.lock_state();
            match &mut *state {
                RefreshState::Refreshing(waiters) => {
                    let (sender, receiver) = oneshot::channel();
                    waiters.push(sender);
                    Some(receiver)
                }
                RefreshState::Idle => {
                    *state = RefreshState::Refreshing(Vec::new());
                    None
                }
            }
        };

        if let Some(receiver) = queued {
            debug!("Token refresh already in flight, waiting for it");
            return receiver.await.unwrap_or_else(|_| {
                Err(ApiError::AuthExpired("token refresh was abandoned".to_string()))
            });
        }

        let mut in_flight = InFlight {
            guard: self,
            settled: false,
        };
        let outcome = self.request_new_token().await;
        if outcome.is_err() {
            self.session.clear();
        }
        in_flight.settle(&outcome);
        outcome
    }

    /// What the session store currently holds, as seen by route guards.
    pub fn auth_status(&self) -> AuthStatus {
        let token = self.session.token();
        AuthStatus {
            has_token: token.is_some(),
            has_user_info: self.session.has_user_info(),
            has_user_role: self.session.has_role(),
            is_admin: self.session.role() == Some(Role::Admin),
            is_expiring_soon: self.is_expiring_soon(token.as_deref()),
        }
    }

    async fn request_new_token(&self) -> Result<String, ApiError> {
        let Some(current) = self.session.token() else {
            warn!("Token refresh requested without a stored token");
            return Err(ApiError::AuthExpired("no token to refresh".to_string()));
        };

        let request = HttpRequest::post(REFRESH_PATH).with_bearer(Some(&current));
        let response = self.transport.send(request).await.map_err(|e| {
            warn!("Token refresh did not reach the server: {}", e);
            ApiError::AuthExpired(format!("token refresh failed: {}", e))
        })?;

        if !response.is_success() {
            warn!("Token refresh answered HTTP {}", response.status);
            return Err(ApiError::AuthExpired(format!(
                "token refresh answered HTTP {}",
                response.status
            )));
        }

        let envelope = decode_envelope(&response.body)
            .map_err(|e| ApiError::AuthExpired(format!("token refresh failed: {}", e)))?;
        if envelope.code != 200 {
            warn!("Token refresh rejected with code {}", envelope.code);
            return Err(ApiError::AuthExpired(envelope.message));
        }
        let token = envelope
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::AuthExpired("refresh response carried no token".to_string()))?;

        self.session
            .set_token(&token)
            .map_err(|e| ApiError::AuthExpired(format!("unable to store refreshed token: {}", e)))?;
        info!("Bearer token refreshed");
        Ok(token)
    }

    fn lock_state(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Returns the guard to `Idle` even when the refreshing future is dropped
/// mid-flight; queued callers then see their sender dropped.
struct InFlight<'a> {
    guard: &'a TokenGuard,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(&mut self, outcome: &Result<String, ApiError>) {
        let waiters = self.take_waiters();
        if !waiters.is_empty() {
            debug!("Handing refresh outcome to {} queued caller(s)", waiters.len());
        }
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
        self.settled = true;
    }

    fn take_waiters(&self) -> Vec<Waiter> {
        let mut state = self.guard.lock_state();
        match std::mem::replace(&mut *state, RefreshState::Idle) {
            RefreshState::Refreshing(waiters) => waiters,
            RefreshState::Idle => Vec::new(),
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("Token refresh dropped before completing");
            drop(self.take_waiters());
        }
    }
}
