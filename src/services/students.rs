use serde_json::Value;

use super::Query;
use crate::api_client::ApiClient;
use crate::data_validation::{parse_paged_envelope, Paged};
use crate::error_handling::types::ApiError;

#[derive(Clone)]
pub struct StudentService {
    client: ApiClient,
}

impl StudentService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn projects(&self, params: Query) -> Result<Paged<Value>, ApiError> {
        let data: Value = self.client.get("/projects/my", params).await?;
        Ok(parse_paged_envelope(&data, Vec::new()))
    }

    pub async fn project(&self, id: u64) -> Result<Value, ApiError> {
        self.client
            .get(&format!("/student/projects/{}", id), Vec::new())
            .await
    }

    pub async fn create_project(&self, project: &Value) -> Result<Value, ApiError> {
        self.client.post("/student/projects", project).await
    }

    pub async fn update_progress(&self, id: u64, progress: &Value) -> Result<Value, ApiError> {
        self.client
            .put(&format!("/student/projects/{}/progress", id), progress)
            .await
    }

    pub async fn delete_project(&self, id: u64) -> Result<Value, ApiError> {
        self.client
            .delete(&format!("/student/projects/{}", id))
            .await
    }
}
