use async_trait::async_trait;
use mantis_types::User;

use crate::error::Result;
use crate::key::StorageKey;

/// Key-value storage for the client session
///
/// Backends only provide raw get/set/remove; the typed accessors are shared.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, key: StorageKey) -> Result<Option<String>>;

    async fn set(&self, key: StorageKey, value: String) -> Result<()>;

    async fn remove(&self, key: StorageKey) -> Result<()>;

    async fn auth_token(&self) -> Result<Option<String>> {
        self.get(StorageKey::AuthToken).await
    }

    async fn identity_token(&self) -> Result<Option<String>> {
        self.get(StorageKey::IdentityToken).await
    }

    /// Token to attach to outbound requests: backend token first, then identity token
    async fn bearer_token(&self) -> Result<Option<String>> {
        match self.auth_token().await? {
            Some(token) => Ok(Some(token)),
            None => self.identity_token().await,
        }
    }

    async fn user(&self) -> Result<Option<User>> {
        match self.get(StorageKey::User).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn save_session(&self, token: &str, user: &User) -> Result<()> {
        self.set(StorageKey::AuthToken, token.to_string()).await?;
        self.set(StorageKey::User, serde_json::to_string(user)?).await
    }

    /// Drops the backend session; identity-provider tokens are left alone
    async fn clear_session(&self) -> Result<()> {
        self.remove(StorageKey::AuthToken).await?;
        self.remove(StorageKey::User).await
    }

    /// Drops every bearer the client could attach, keeping only the refresh token
    async fn clear_credentials(&self) -> Result<()> {
        self.clear_session().await?;
        self.remove(StorageKey::IdentityToken).await
    }
}
