use std::sync::Arc;

use chrono::Duration;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::envelope::{decode_envelope, error_message, Envelope};
use super::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
use crate::configuration::types::ClientConfig;
use crate::error_handling::types::ApiError;
use crate::session_management::SessionState;
use crate::token_management::token_guard::TokenGuard;

/// The one HTTP client every resource wrapper goes through.
///
/// Attaches the stored bearer token, refreshes it through the shared
/// `TokenGuard` when it is about to expire, retries once after a 401, and maps
/// every failure onto `ApiError`.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    guard: Arc<TokenGuard>,
    proactive_refresh: bool,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, session: SessionState) -> Self {
        let guard = Arc::new(TokenGuard::new(transport.clone(), session));
        Self::with_guard(transport, guard)
    }

    pub fn with_guard(transport: Arc<dyn Transport>, guard: Arc<TokenGuard>) -> Self {
        Self {
            transport,
            guard,
            proactive_refresh: true,
        }
    }

    pub fn from_config(config: &ClientConfig, session: SessionState) -> Result<Self, ApiError> {
        let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::from_config(config)?);
        let guard = TokenGuard::new(transport.clone(), session)
            .with_refresh_window(Duration::seconds(config.refresh_window_secs));
        Ok(Self::with_guard(transport, Arc::new(guard))
            .with_proactive_refresh(config.proactive_refresh))
    }

    /// When disabled, an expiring token is sent as-is and only a 401 triggers a refresh.
    pub fn with_proactive_refresh(mut self, enabled: bool) -> Self {
        self.proactive_refresh = enabled;
        self
    }

    pub fn session(&self) -> &SessionState {
        self.guard.session()
    }

    pub fn guard(&self) -> &Arc<TokenGuard> {
        &self.guard
    }

    /// Sends `request` and returns the whole envelope, for endpoints that carry
    /// more than `data` (login's `token`).
    pub async fn request_envelope(&self, request: HttpRequest) -> Result<Envelope, ApiError> {
        let token = self.outgoing_token().await?;
        let response = self
            .transport
            .send(request.clone().with_bearer(token.as_deref()))
            .await?;

        if response.status != 401 {
            return read_response(response);
        }

        if token.is_none() {
            self.session().clear();
            return Err(ApiError::AuthExpired(error_message(401, &response.body)));
        }

        // A concurrent caller may already have replaced the token we sent.
        let renewed = match self.session().token() {
            Some(current) if token.as_deref() != Some(current.as_str()) => {
                info!(
                    "{} {} answered 401 with a superseded token, retrying",
                    request.method, request.path
                );
                current
            }
            _ => {
                info!("{} {} answered 401, refreshing token", request.method, request.path);
                self.guard.refresh().await?
            }
        };
        let retried = self
            .transport
            .send(request.with_bearer(Some(&renewed)))
            .await?;
        if retried.status == 401 {
            warn!("Request still unauthorized after token refresh, dropping session");
            self.session().clear();
            return Err(ApiError::AuthExpired(error_message(401, &retried.body)));
        }
        read_response(retried)
    }

    /// Sends `request` and decodes the envelope's `data` as `T`.
    pub async fn call<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T, ApiError> {
        self.request_envelope(request).await?.into_data()
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<T, ApiError> {
        self.call(HttpRequest::get(path).with_query(query)).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.call(HttpRequest::post(path).with_body(to_body(body)?)).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.call(HttpRequest::put(path).with_body(to_body(body)?)).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.call(HttpRequest::patch(path).with_body(to_body(body)?)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.call(HttpRequest::delete(path)).await
    }

    // The token to attach, refreshed first when proactive refresh is on and it
    // is about to expire. No stored token means an unauthenticated request.
    async fn outgoing_token(&self) -> Result<Option<String>, ApiError> {
        let Some(token) = self.session().token() else {
            return Ok(None);
        };
        if self.proactive_refresh && self.guard.is_expiring_soon(Some(&token)) {
            debug!("Stored token is expiring soon, refreshing before sending");
            return self.guard.get_valid_token().await.map(Some);
        }
        Ok(Some(token))
    }
}

fn to_body<B: Serialize + ?Sized>(body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body)
        .map_err(|e| ApiError::Decode(format!("unable to encode request body: {}", e)))
}

fn read_response(response: HttpResponse) -> Result<Envelope, ApiError> {
    if !response.is_success() {
        let message = error_message(response.status, &response.body);
        debug!("Request failed with HTTP {}: {}", response.status, message);
        return Err(ApiError::from_status(response.status, message));
    }

    let envelope = decode_envelope(&response.body)?;
    if !envelope.is_success() {
        debug!(
            "Request rejected with code {}: {}",
            envelope.code, envelope.message
        );
        return Err(ApiError::Rejected {
            code: envelope.code,
            message: envelope.message,
        });
    }
    Ok(envelope)
}
