use std::sync::Arc;

use async_trait::async_trait;
use mantis_persist::{CredentialStore, StorageKey};
use mantis_types::SessionEvent;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::error::{ApiError, Result};
use crate::session_bus::SessionBus;

pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:5173/callback";
const DEFAULT_SCOPE: &str = "openid profile email offline_access";

/// Third-party identity provider the refresh coordinator talks to
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Obtains a fresh token without user interaction
    async fn refresh_silently(&self) -> Result<String>;

    /// Starts interactive login
    async fn login_with_redirect(&self) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// Tenant domain; a bare host gets `https://` prepended
    pub domain: String,
    pub client_id: String,
    pub audience: Option<String>,
    pub redirect_uri: String,
}

impl OAuthConfig {
    pub fn new(domain: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            client_id: client_id.into(),
            audience: None,
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
        }
    }

    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = redirect_uri.into();
        self
    }

    fn issuer(&self) -> Result<Url> {
        let domain = self.domain.trim_end_matches('/');
        let raw = if domain.starts_with("http://") || domain.starts_with("https://") {
            format!("{domain}/")
        } else {
            format!("https://{domain}/")
        };
        Url::parse(&raw).map_err(|e| ApiError::Setup {
            message: format!("Invalid identity domain '{}': {}", self.domain, e),
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    id_token: Option<String>,
    refresh_token: Option<String>,
}

/// OAuth 2.0 provider using the refresh-token grant for silent refresh
pub struct OAuthIdentityProvider {
    http_client: reqwest::Client,
    config: OAuthConfig,
    store: Arc<dyn CredentialStore>,
    bus: SessionBus,
}

impl OAuthIdentityProvider {
    pub fn new(config: OAuthConfig, store: Arc<dyn CredentialStore>, bus: SessionBus) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            config,
            store,
            bus,
        }
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Interactive login URL (authorization code flow)
    pub fn authorize_url(&self) -> Result<Url> {
        let mut url = self.config.issuer()?.join("authorize").map_err(|e| ApiError::Setup {
            message: e.to_string(),
        })?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("response_type", "code")
                .append_pair("client_id", &self.config.client_id)
                .append_pair("redirect_uri", &self.config.redirect_uri)
                .append_pair("scope", DEFAULT_SCOPE);
            if let Some(audience) = &self.config.audience {
                query.append_pair("audience", audience);
            }
        }
        Ok(url)
    }

    fn token_url(&self) -> Result<Url> {
        self.config.issuer()?.join("oauth/token").map_err(|e| ApiError::Setup {
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl IdentityProvider for OAuthIdentityProvider {
    async fn refresh_silently(&self) -> Result<String> {
        let refresh_token = self
            .store
            .get(StorageKey::IdentityRefreshToken)
            .await?
            .ok_or_else(|| ApiError::Identity("No refresh token available".to_string()))?;

        let mut body = serde_json::json!({
            "grant_type": "refresh_token",
            "client_id": self.config.client_id,
            "refresh_token": refresh_token,
        });
        if let Some(audience) = &self.config.audience {
            body["audience"] = serde_json::json!(audience);
        }

        debug!("Requesting identity token refresh");
        let response = self
            .http_client
            .post(self.token_url()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Identity(format!("Token endpoint unreachable: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ApiError::Identity(format!("Token endpoint error ({}): {}", status, error_text)));
        }

        let tokens: TokenResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Identity(format!("Failed to parse token response: {}", e)))?;

        if let Some(rotated) = tokens.refresh_token {
            self.store.set(StorageKey::IdentityRefreshToken, rotated).await?;
        }

        tokens
            .access_token
            .or(tokens.id_token)
            .ok_or_else(|| ApiError::Identity("Token response carried no token".to_string()))
    }

    async fn login_with_redirect(&self) -> Result<()> {
        let url = self.authorize_url()?;
        info!("Interactive login required");
        self.bus.publish(SessionEvent::LoginRedirect { url: url.to_string() });
        Ok(())
    }
}
