use serde_json::{json, Value};

use crate::api_client::{ApiClient, HttpRequest, PageData};
use crate::data_validation::Paged;
use crate::error_handling::types::ApiError;
use crate::models::{
    BatchDeleteResult, NewUser, PasswordReset, StatusChange, User, UserQuery, UserStats,
    UserStatus, UserUpdate,
};

/// User administration and the caller's own profile.
#[derive(Clone)]
pub struct UserService {
    client: ApiClient,
}

impl UserService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: &UserQuery) -> Result<Paged<User>, ApiError> {
        let page: PageData<User> = self.client.get("/users", query.to_pairs()).await?;
        Ok(page.into())
    }

    pub async fn get(&self, id: u64) -> Result<User, ApiError> {
        self.client.get(&format!("/users/{}", id), Vec::new()).await
    }

    pub async fn create(&self, user: &NewUser) -> Result<User, ApiError> {
        self.client.post("/users", user).await
    }

    pub async fn update(&self, id: u64, update: &UserUpdate) -> Result<User, ApiError> {
        self.client.put(&format!("/users/{}", id), update).await
    }

    pub async fn delete(&self, id: u64) -> Result<(), ApiError> {
        self.client
            .delete::<Value>(&format!("/users/{}", id))
            .await
            .map(drop)
    }

    pub async fn set_status(&self, id: u64, status: UserStatus) -> Result<StatusChange, ApiError> {
        self.client
            .patch(&format!("/users/{}/status", id), &json!({ "status": status }))
            .await
    }

    pub async fn reset_password(&self, id: u64) -> Result<PasswordReset, ApiError> {
        self.client
            .call(HttpRequest::post(format!("/users/{}/reset-password", id)))
            .await
    }

    pub async fn batch_delete(&self, ids: &[u64]) -> Result<BatchDeleteResult, ApiError> {
        self.client
            .post("/users/batch-delete", &json!({ "userIds": ids }))
            .await
    }

    pub async fn stats(&self) -> Result<UserStats, ApiError> {
        self.client.get("/users/stats", Vec::new()).await
    }

    pub async fn profile(&self) -> Result<Value, ApiError> {
        self.client.get("/users/profile", Vec::new()).await
    }

    pub async fn update_profile(&self, profile: &Value) -> Result<Value, ApiError> {
        self.client.put("/users/profile", profile).await
    }

    pub async fn change_password(&self, old: &str, new: &str) -> Result<Value, ApiError> {
        self.client
            .put(
                "/users/change-password",
                &json!({ "oldPassword": old, "newPassword": new }),
            )
            .await
    }
}
