use serde_json::{json, Value};

use super::Query;
use crate::api_client::{ApiClient, HttpRequest};
use crate::data_validation::{ensure_list, parse_paged_envelope, Paged};
use crate::error_handling::types::ApiError;

/// Reason recorded with every forced status change.
pub const FORCE_UPDATE_REASON: &str = "管理员强制更新";

/// Administrator-only project management and system statistics.
#[derive(Clone)]
pub struct AdminService {
    client: ApiClient,
}

impl AdminService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn project_stats(&self) -> Result<Value, ApiError> {
        self.client.get("/admin/projects/stats", Vec::new()).await
    }

    /// Sets a project's status regardless of its review state.
    pub async fn force_update_status(
        &self,
        project_id: u64,
        status: &str,
    ) -> Result<Value, ApiError> {
        self.client
            .put(
                &format!("/admin/projects/{}/status", project_id),
                &json!({ "status": status, "reason": FORCE_UPDATE_REASON }),
            )
            .await
    }

    pub async fn soft_delete_project(&self, project_id: u64) -> Result<(), ApiError> {
        self.client
            .delete::<Value>(&format!("/admin/projects/{}/soft", project_id))
            .await
            .map(drop)
    }

    pub async fn restore_project(&self, project_id: u64) -> Result<Value, ApiError> {
        self.client
            .call(HttpRequest::put(format!("/admin/projects/{}/restore", project_id)))
            .await
    }

    /// Purges invalid project records on the backend.
    pub async fn cleanup_projects(&self) -> Result<Value, ApiError> {
        self.client
            .call(HttpRequest::post("/admin/projects/cleanup"))
            .await
    }

    pub async fn project_logs(
        &self,
        project_id: u64,
        params: Query,
    ) -> Result<Paged<Value>, ApiError> {
        let data: Value = self
            .client
            .get(&format!("/admin/projects/{}/logs", project_id), params)
            .await?;
        Ok(parse_paged_envelope(&data, Vec::new()))
    }

    pub async fn project_reviews(&self, project_id: u64) -> Result<Vec<Value>, ApiError> {
        let data: Value = self
            .client
            .get(&format!("/admin/projects/{}/reviews", project_id), Vec::new())
            .await?;
        Ok(ensure_list(data, Vec::new()))
    }

    /// Applies one review decision to several projects.
    pub async fn batch_review(
        &self,
        project_ids: &[u64],
        review: &Value,
    ) -> Result<Value, ApiError> {
        let mut body = json!({ "projectIds": project_ids });
        if let (Some(body), Some(review)) = (body.as_object_mut(), review.as_object()) {
            for (key, value) in review {
                body.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
        self.client.post("/admin/projects/batch-review", &body).await
    }

    pub async fn system_overview(&self) -> Result<Value, ApiError> {
        self.client.get("/admin/system/overview", Vec::new()).await
    }

    pub async fn dashboard_stats(&self) -> Result<Value, ApiError> {
        self.client.get("/admin/dashboard/stats", Vec::new()).await
    }
}
