use serde_json::Value;

use super::Query;
use crate::api_client::{ApiClient, HttpRequest};
use crate::data_validation::{parse_paged_envelope, safe_property, Paged};
use crate::error_handling::types::ApiError;

#[derive(Clone)]
pub struct NotificationService {
    client: ApiClient,
}

impl NotificationService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, params: Query) -> Result<Paged<Value>, ApiError> {
        let data: Value = self.client.get("/notifications", params).await?;
        Ok(parse_paged_envelope(&data, Vec::new()))
    }

    /// Reads `{unreadCount: n}`, or a bare number. Anything else counts as zero.
    pub async fn unread_count(&self) -> Result<u64, ApiError> {
        let data: Value = self
            .client
            .get("/notifications/unread-count", Vec::new())
            .await?;
        let count = match data {
            Value::Number(n) => n.as_u64(),
            other => safe_property(&other, "unreadCount", Value::Null).as_u64(),
        };
        Ok(count.unwrap_or(0))
    }

    pub async fn mark_read(&self, id: u64) -> Result<Value, ApiError> {
        self.client
            .call(HttpRequest::put(format!("/notifications/{}/read", id)))
            .await
    }

    pub async fn mark_all_read(&self) -> Result<Value, ApiError> {
        self.client
            .call(HttpRequest::put("/notifications/read-all"))
            .await
    }

    pub async fn delete(&self, id: u64) -> Result<Value, ApiError> {
        self.client.delete(&format!("/notifications/{}", id)).await
    }

    pub async fn preferences(&self) -> Result<Value, ApiError> {
        self.client
            .get("/notifications/preferences", Vec::new())
            .await
    }

    pub async fn update_preferences(&self, preferences: &Value) -> Result<Value, ApiError> {
        self.client
            .put("/notifications/preferences", preferences)
            .await
    }
}
