use serde_json::Value;

use crate::api_client::ApiClient;
use crate::data_validation::{parse_paged_envelope, Paged};
use crate::error_handling::types::ApiError;

/// Project categories, maintained by administrators.
#[derive(Clone)]
pub struct ProjectTypeService {
    client: ApiClient,
}

impl ProjectTypeService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Paged<Value>, ApiError> {
        let data: Value = self.client.get("/project-types", Vec::new()).await?;
        Ok(parse_paged_envelope(&data, Vec::new()))
    }

    pub async fn stats(&self) -> Result<Value, ApiError> {
        self.client.get("/project-types/stats", Vec::new()).await
    }

    pub async fn detail(&self, id: u64) -> Result<Value, ApiError> {
        self.client
            .get(&format!("/project-types/{}", id), Vec::new())
            .await
    }

    pub async fn create(&self, project_type: &Value) -> Result<Value, ApiError> {
        self.client.post("/project-types", project_type).await
    }

    pub async fn update(&self, id: u64, project_type: &Value) -> Result<Value, ApiError> {
        self.client
            .put(&format!("/project-types/{}", id), project_type)
            .await
    }

    pub async fn delete(&self, id: u64) -> Result<(), ApiError> {
        self.client
            .delete::<Value>(&format!("/project-types/{}", id))
            .await
            .map(drop)
    }
}
