use mantis_persist::CredentialStore;
use mantis_types::{UpdateUserRequest, User, UserInvite};
use tracing::info;

use crate::envelope;
use crate::error::Result;
use crate::http::ApiClient;

impl ApiClient {
    pub async fn get_user(&self, user_id: &str) -> Result<User> {
        envelope::data(&self.get(&format!("/users/{}", user_id)).await?)
    }

    /// Admin-only update of another user
    pub async fn update_user(&self, user_id: &str, request: &UpdateUserRequest) -> Result<User> {
        envelope::data(&self.put(&format!("/users/{}", user_id), request).await?)
    }

    pub async fn get_current_user(&self) -> Result<User> {
        envelope::data(&self.get("/users/me").await?)
    }

    pub async fn update_current_user(&self, request: &UpdateUserRequest) -> Result<User> {
        envelope::data(&self.put("/users/me", request).await?)
    }

    pub async fn search_users(&self, query: &str, limit: Option<u32>) -> Result<Vec<User>> {
        let mut params = vec![("q", query.to_string())];
        if let Some(limit) = limit {
            params.push(("limit", limit.to_string()));
        }
        envelope::data(&self.get_with_query("/users/search", &params).await?)
    }

    pub async fn list_invites(&self) -> Result<Vec<UserInvite>> {
        envelope::data(&self.get("/users/me/invites").await?)
    }

    pub async fn accept_invite(&self, invite_id: &str) -> Result<()> {
        self.post_empty(&format!("/users/me/invites/{}/accept", invite_id)).await?;
        info!("Accepted invite {}", invite_id);
        Ok(())
    }

    pub async fn decline_invite(&self, invite_id: &str) -> Result<()> {
        self.post_empty(&format!("/users/me/invites/{}/decline", invite_id)).await?;
        Ok(())
    }

    pub async fn delete_account(&self) -> Result<()> {
        self.delete("/users/me").await?;
        self.store().clear_session().await?;
        info!("Deleted current account");
        Ok(())
    }
}
