use log::debug;
use serde_json::{json, Value};

use super::{query, Query};
use crate::api_client::ApiClient;
use crate::data_validation::{ensure_list, filter_valid_records, parse_paged_envelope};
use crate::error_handling::types::ApiError;

/// Fields a project row needs before it can be shown in a list.
pub const PROJECT_REQUIRED_FIELDS: [&str; 2] = ["id", "name"];

#[derive(Clone)]
pub struct ProjectService {
    client: ApiClient,
}

impl ProjectService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// The caller's projects, optionally filtered by status. Rows without an
    /// `id` or a `name` are dropped.
    pub async fn my_projects(&self, status: Option<&str>) -> Result<Vec<Value>, ApiError> {
        let params = query(&[("status", status.unwrap_or_default())]);
        let data: Value = self.client.get("/projects/my", params).await?;
        let rows = parse_paged_envelope(&data, Vec::new()).items;
        let valid = filter_valid_records(&rows, &PROJECT_REQUIRED_FIELDS, Vec::new());
        debug!("Kept {} of {} project row(s)", valid.len(), rows.len());
        Ok(valid)
    }

    pub async fn detail(&self, id: u64) -> Result<Value, ApiError> {
        let params: Query = vec![("id".to_string(), id.to_string())];
        self.client.get("/projects/detail", params).await
    }

    pub async fn create(&self, project: &Value) -> Result<Value, ApiError> {
        self.client.post("/projects", project).await
    }

    /// Hands the project over for review.
    pub async fn submit(&self, id: u64) -> Result<Value, ApiError> {
        self.client.post("/projects/submit", &json!({ "id": id })).await
    }

    pub async fn reviews(&self, id: u64) -> Result<Vec<Value>, ApiError> {
        let data: Value = self
            .client
            .get(&format!("/projects/{}/reviews", id), Vec::new())
            .await?;
        Ok(ensure_list(data, Vec::new()))
    }
}
