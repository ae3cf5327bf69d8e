use serde_json::Value;

use super::Query;
use crate::api_client::ApiClient;
use crate::data_validation::{ensure_list, parse_paged_envelope, Paged};
use crate::error_handling::types::ApiError;

#[derive(Clone)]
pub struct CompetitionService {
    client: ApiClient,
}

impl CompetitionService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, params: Query) -> Result<Paged<Value>, ApiError> {
        let data: Value = self.client.get("/competitions", params).await?;
        Ok(parse_paged_envelope(&data, Vec::new()))
    }

    /// Competitions still open for registration.
    pub async fn available(&self, params: Query) -> Result<Paged<Value>, ApiError> {
        let data: Value = self.client.get("/competitions/available", params).await?;
        Ok(parse_paged_envelope(&data, Vec::new()))
    }

    pub async fn register(&self, registration: &Value) -> Result<Value, ApiError> {
        self.client
            .post("/student-competitions/register", registration)
            .await
    }

    pub async fn my_registrations(&self) -> Result<Vec<Value>, ApiError> {
        let data: Value = self
            .client
            .get("/student-competitions/my", Vec::new())
            .await?;
        Ok(ensure_list(data, Vec::new()))
    }

    pub async fn stats(&self) -> Result<Value, ApiError> {
        self.client.get("/competitions/stats", Vec::new()).await
    }
}
