use mantis_persist::{CredentialStore, StorageKey};
use mantis_types::{
    AuthResponse, ChangePasswordRequest, LoginRequest, RefreshTokenResponse, RegisterRequest,
    ResetPasswordRequest, SessionEvent, User,
};
use tracing::{info, warn};

use crate::envelope;
use crate::error::Result;
use crate::http::ApiClient;

impl ApiClient {
    /// Signs in and persists the returned session
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse> {
        let auth: AuthResponse = envelope::extract(&self.post("/auth/login", request).await?, &["token", "user"])?;
        self.store().save_session(&auth.token, &auth.user).await?;
        info!("Signed in as {}", auth.user.email);
        Ok(auth)
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        let auth: AuthResponse = envelope::extract(&self.post("/auth/register", request).await?, &["token", "user"])?;
        self.store().save_session(&auth.token, &auth.user).await?;
        info!("Registered {}", auth.user.email);
        Ok(auth)
    }

    /// Clears the local session even when the backend call fails
    pub async fn logout(&self) -> Result<()> {
        if let Err(e) = self.post_empty("/auth/logout").await {
            warn!("Logout request failed, clearing local session anyway: {}", e);
        }
        self.store().clear_session().await?;
        self.session_bus().publish(SessionEvent::LoggedOut);
        Ok(())
    }

    pub async fn refresh_token(&self) -> Result<RefreshTokenResponse> {
        let refreshed: RefreshTokenResponse = envelope::extract(&self.post_empty("/auth/refresh").await?, &["token"])?;
        self.store().set(StorageKey::AuthToken, refreshed.token.clone()).await?;
        Ok(refreshed)
    }

    pub async fn get_profile(&self) -> Result<User> {
        envelope::data(&self.get("/auth/profile").await?)
    }

    pub async fn update_profile(&self, user: &User) -> Result<User> {
        let updated: User = envelope::data(&self.put("/auth/profile", user).await?)?;
        if let Some(token) = self.store().auth_token().await? {
            self.store().save_session(&token, &updated).await?;
        }
        Ok(updated)
    }

    pub async fn change_password(&self, request: &ChangePasswordRequest) -> Result<()> {
        self.post("/auth/change-password", request).await?;
        Ok(())
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        self.post("/auth/forgot-password", &serde_json::json!({ "email": email })).await?;
        Ok(())
    }

    pub async fn reset_password(&self, request: &ResetPasswordRequest) -> Result<()> {
        self.post("/auth/reset-password", request).await?;
        Ok(())
    }
}
