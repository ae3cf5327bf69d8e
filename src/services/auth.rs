use log::{debug, info, warn};
use serde_json::{json, Value};

use crate::api_client::{ApiClient, HttpRequest};
use crate::error_handling::types::ApiError;
use crate::models::{Role, User};
use crate::session_management::{AuthStatus, Session};

/// Result of a login attempt the server answered.
///
/// Refusals are not errors: the backend reports them in the envelope `code`
/// (or the HTTP status) and the login form shows the message.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    LoggedIn {
        user: Value,
        token: String,
        message: String,
    },
    Refused {
        code: i64,
        message: String,
    },
}

impl LoginOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LoginOutcome::LoggedIn { .. })
    }
}

#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Sends the credentials and, on success, starts a new session.
    ///
    /// Any previous session is dropped first, so a stale token is never
    /// attached to (or refreshed for) the login request itself. Only transport,
    /// decoding and storage failures come back as `Err`.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<LoginOutcome, ApiError> {
        self.client.session().clear();
        let body = json!({
            "username": username,
            "password": password,
            "role": role.as_str(),
        });

        let envelope = match self
            .client
            .request_envelope(HttpRequest::post("/login").with_body(body))
            .await
        {
            Ok(envelope) => envelope,
            Err(e) => return refused(e),
        };

        let Some(token) = envelope.token.filter(|t| !t.is_empty()) else {
            warn!("Login answered code {} without a token", envelope.code);
            return Ok(LoginOutcome::Refused {
                code: envelope.code,
                message: non_empty_or(envelope.message, "Login failed"),
            });
        };

        let user = envelope.data.unwrap_or(Value::Null);
        let session_role = user
            .get("role")
            .and_then(Value::as_str)
            .and_then(|r| r.parse().ok())
            .unwrap_or(role);
        self.client
            .session()
            .begin(&Session::new(token.clone(), session_role, user.clone()))?;
        info!("Logged in as {} ({})", username, session_role);

        Ok(LoginOutcome::LoggedIn {
            user,
            token,
            message: non_empty_or(envelope.message, "Login successful"),
        })
    }

    pub fn logout(&self) {
        self.client.session().clear();
        info!("Logged out");
    }

    /// The account behind the current token, as the server sees it.
    pub async fn user_info(&self) -> Result<User, ApiError> {
        self.client.get("/auth/user-info", Vec::new()).await
    }

    pub fn check_auth(&self) -> AuthStatus {
        self.client.guard().auth_status()
    }

    pub fn token(&self) -> Option<String> {
        self.client.session().token()
    }
}

fn refused(err: ApiError) -> Result<LoginOutcome, ApiError> {
    let (code, message) = match err {
        ApiError::Rejected { code, message } => (code, message),
        ApiError::AuthExpired(message) => (401, message),
        ApiError::PermissionDenied(message) => (403, message),
        ApiError::Validation { status, message } | ApiError::Server { status, message } => {
            (i64::from(status), message)
        }
        other => return Err(other),
    };
    debug!("Login refused with code {}: {}", code, message);
    Ok(LoginOutcome::Refused {
        code,
        message: non_empty_or(message, "Login failed, check username and password"),
    })
}

fn non_empty_or(message: String, fallback: &str) -> String {
    if message.is_empty() {
        fallback.to_string()
    } else {
        message
    }
}
