use serde_json::Value;

use super::Query;
use crate::api_client::ApiClient;
use crate::data_validation::{parse_paged_envelope, Paged};
use crate::error_handling::types::ApiError;

/// The supervising teacher's view of students and their projects.
#[derive(Clone)]
pub struct TeacherService {
    client: ApiClient,
}

impl TeacherService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn students(&self, params: Query) -> Result<Paged<Value>, ApiError> {
        let data: Value = self.client.get("/teachers/students", params).await?;
        Ok(parse_paged_envelope(&data, Vec::new()))
    }

    pub async fn student(&self, id: u64) -> Result<Value, ApiError> {
        self.client
            .get(&format!("/students/{}", id), Vec::new())
            .await
    }

    /// Projects this teacher supervises; accepts a paged payload or a bare list.
    pub async fn projects(&self, params: Query) -> Result<Paged<Value>, ApiError> {
        let data: Value = self.client.get("/teachers/projects", params).await?;
        Ok(parse_paged_envelope(&data, Vec::new()))
    }

    pub async fn review_project(&self, id: u64, review: &Value) -> Result<Value, ApiError> {
        self.client
            .put(&format!("/projects/{}/review", id), review)
            .await
    }
}
