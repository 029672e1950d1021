use std::sync::Arc;
use std::time::Duration;

use mantis_persist::{CredentialStore, MemoryStore};
use mantis_types::SessionEvent;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::error::{ApiError, Result};
use crate::refresh::TokenRefreshCoordinator;
use crate::session_bus::SessionBus;
use crate::upload::{self, ProgressCallback, UploadFile};

pub const DEFAULT_BASE_URL: &str = "https://mantis-api.azurewebsites.net/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_millis(300_000);

/// HTTP adapter for the backend
///
/// Attaches the stored bearer token, classifies failures into [`ApiError`] and
/// hands back the raw JSON body for envelope normalization.
#[derive(Clone)]
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
    store: Arc<dyn CredentialStore>,
    bus: SessionBus,
    refresher: Option<Arc<TokenRefreshCoordinator>>,
    upload_timeout: Duration,
}

impl ApiClient {
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn session_bus(&self) -> &SessionBus {
        &self.bus
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Stored token first; without one, session-bound paths go through the refresher
    async fn bearer_token(&self, path: &str) -> Result<Option<String>> {
        if let Some(token) = self.store.bearer_token().await? {
            return Ok(Some(token));
        }
        match &self.refresher {
            Some(refresher) if !is_public_path(path) => Ok(Some(refresher.request_token().await?)),
            _ => Ok(None),
        }
    }

    async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let builder = self.http_client.request(method, self.url(path));
        Ok(match self.bearer_token(path).await? {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn execute(&self, method: Method, path: &str, builder: RequestBuilder) -> Result<Value> {
        debug!("API request: {} {}", method, path);
        let response = builder.send().await.map_err(|e| {
            error!("API error: {} {} -> {}", method, path, e);
            classify_transport(e)
        })?;
        self.handle_response(&method, path, response).await
    }

    async fn handle_response(&self, method: &Method, path: &str, response: Response) -> Result<Value> {
        let status = response.status();
        let bytes = response.bytes().await.map_err(classify_transport)?;

        if status.is_success() {
            debug!("API response: {} {} -> {}", method, path, status);
            if bytes.is_empty() {
                return Ok(Value::Null);
            }
            return Ok(serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned())));
        }

        let body: Option<Value> = serde_json::from_slice(&bytes).ok();
        error!("API error: {} {} -> {}", method, path, status);
        Err(self.classify_status(status, body).await)
    }

    async fn classify_status(&self, status: StatusCode, body: Option<Value>) -> ApiError {
        let field = |name: &str| {
            body.as_ref()
                .and_then(|b| b.get(name))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        let message = field("message")
            .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));

        match status {
            StatusCode::UNAUTHORIZED => {
                if let Err(e) = self.store.clear_credentials().await {
                    warn!("Failed to clear stored credentials after 401: {}", e);
                }
                self.bus.publish(SessionEvent::LoggedOut);
                ApiError::Authentication { message }
            }
            StatusCode::FORBIDDEN => ApiError::Permission { message },
            StatusCode::NOT_FOUND => ApiError::NotFound { message },
            StatusCode::BAD_REQUEST => ApiError::Validation { message, details: body },
            _ => ApiError::Server {
                status: status.as_u16(),
                code: field("code"),
                message,
                details: body,
            },
        }
    }

    pub async fn get(&self, path: &str) -> Result<Value> {
        let builder = self.request(Method::GET, path).await?;
        self.execute(Method::GET, path, builder).await
    }

    pub async fn get_with_query(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let builder = self.request(Method::GET, path).await?.query(query);
        self.execute(Method::GET, path, builder).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        let builder = self.request(Method::POST, path).await?.json(body);
        self.execute(Method::POST, path, builder).await
    }

    pub async fn post_empty(&self, path: &str) -> Result<Value> {
        let builder = self.request(Method::POST, path).await?;
        self.execute(Method::POST, path, builder).await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        let builder = self.request(Method::PUT, path).await?.json(body);
        self.execute(Method::PUT, path, builder).await
    }

    pub async fn patch<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        let builder = self.request(Method::PATCH, path).await?.json(body);
        self.execute(Method::PATCH, path, builder).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value> {
        let builder = self.request(Method::DELETE, path).await?;
        self.execute(Method::DELETE, path, builder).await
    }

    /// Raw body of a successful GET, for binary downloads
    pub async fn get_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let builder = self.request(Method::GET, path).await?;
        debug!("API request: GET {} (binary)", path);
        let response = builder.send().await.map_err(classify_transport)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.json::<Value>().await.ok();
            error!("API error: GET {} -> {}", path, status);
            return Err(self.classify_status(status, body).await);
        }
        let bytes = response.bytes().await.map_err(classify_transport)?;
        Ok(bytes.to_vec())
    }

    /// Multipart POST of `file` (plus optional JSON `metadata`), reporting progress
    pub async fn upload(
        &self,
        path: &str,
        file: UploadFile,
        metadata: Option<&Value>,
        on_progress: Option<ProgressCallback>,
    ) -> Result<Value> {
        let form = upload::form(file, metadata, on_progress)?;
        let builder = self
            .request(Method::POST, path)
            .await?
            .multipart(form)
            .timeout(self.upload_timeout);
        self.execute(Method::POST, path, builder).await
    }
}

/// Endpoints that are called before any session exists
const PUBLIC_PATHS: [&str; 4] = [
    "/auth/login",
    "/auth/register",
    "/auth/forgot-password",
    "/auth/reset-password",
];

fn is_public_path(path: &str) -> bool {
    let path = format!("/{}", path.trim_start_matches('/'));
    PUBLIC_PATHS.contains(&path.as_str())
}

/// Maps a transport-level reqwest failure onto network vs setup errors
fn classify_transport(e: reqwest::Error) -> ApiError {
    if e.is_builder() {
        ApiError::Setup {
            message: e.to_string(),
        }
    } else {
        ApiError::Network {
            message: "Network error - please check your connection".to_string(),
        }
    }
}

#[derive(Default)]
pub struct ApiClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    upload_timeout: Option<Duration>,
    store: Option<Arc<dyn CredentialStore>>,
    bus: Option<SessionBus>,
    refresher: Option<Arc<TokenRefreshCoordinator>>,
}

impl ApiClientBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn upload_timeout(mut self, timeout: Duration) -> Self {
        self.upload_timeout = Some(timeout);
        self
    }

    pub fn store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn session_bus(mut self, bus: SessionBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Used to obtain a token when nothing is stored
    pub fn refresher(mut self, refresher: Arc<TokenRefreshCoordinator>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()
            .map_err(|e| ApiError::Setup {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(ApiClient {
            http_client,
            base_url,
            store: self.store.unwrap_or_else(|| Arc::new(MemoryStore::new())),
            bus: self.bus.unwrap_or_default(),
            refresher: self.refresher,
            upload_timeout: self.upload_timeout.unwrap_or(DEFAULT_UPLOAD_TIMEOUT),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_paths() {
        assert!(is_public_path("/auth/login"));
        assert!(is_public_path("auth/register"));
        assert!(!is_public_path("/auth/logout"));
        assert!(!is_public_path("/auth/profile"));
        assert!(!is_public_path("/teams"));
    }
}
