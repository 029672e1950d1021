use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use mantis_client::{ApiClient, OAuthConfig, OAuthIdentityProvider, SessionBus, TokenRefreshCoordinator};
use mantis_persist::{CredentialStore, FileStore, MemoryStore};
use mantis_session::{
    AuthStore, ChatTurnCoordinator, DocumentTracker, ProjectStore, RunOrchestrator, TeamStore, ThreadBrowser,
};
use mantis_types::{DocumentPollConfig, ProjectScope, ThreadPageConfig, TurnConfig};
use tracing::info;

/// High-level builder for a configured [`Mantis`] client
///
/// # Example
///
/// ```rust,no_run
/// use mantis::prelude::*;
///
/// # fn main() -> Result<()> {
/// let mantis = MantisBuilder::new()
///     .base_url("http://localhost:5000/api")
///     .identity(OAuthConfig::new("tenant.auth0.com", "client-id"))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct MantisBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    upload_timeout: Option<Duration>,
    store: Option<Arc<dyn CredentialStore>>,
    credentials_file: Option<PathBuf>,
    identity: Option<OAuthConfig>,
    turn: TurnConfig,
    documents: DocumentPollConfig,
    threads: ThreadPageConfig,
}

impl MantisBuilder {
    pub fn new() -> Self {
        Self::default()
    }

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

    /// Custom credential storage; takes precedence over [`credentials_file`](Self::credentials_file)
    pub fn store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Persist credentials in a JSON file (default: in memory only)
    pub fn credentials_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_file = Some(path.into());
        self
    }

    /// Enables silent token refresh and login redirects
    pub fn identity(mut self, config: OAuthConfig) -> Self {
        self.identity = Some(config);
        self
    }

    pub fn turn_config(mut self, config: TurnConfig) -> Self {
        self.turn = config;
        self
    }

    pub fn document_poll_config(mut self, config: DocumentPollConfig) -> Self {
        self.documents = config;
        self
    }

    pub fn thread_page_config(mut self, config: ThreadPageConfig) -> Self {
        self.threads = config;
        self
    }

    /// Build the client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn build(self) -> Result<Mantis> {
        let store: Arc<dyn CredentialStore> = match (self.store, self.credentials_file) {
            (Some(store), _) => store,
            (None, Some(path)) => Arc::new(FileStore::new(path)),
            (None, None) => Arc::new(MemoryStore::new()),
        };
        let bus = SessionBus::new();

        let refresher = self.identity.map(|config| {
            info!("Identity provider configured for {}", config.domain);
            let provider = Arc::new(OAuthIdentityProvider::new(config, store.clone(), bus.clone()));
            Arc::new(TokenRefreshCoordinator::new(provider, store.clone(), bus.clone()))
        });

        let mut client = ApiClient::builder().store(store.clone()).session_bus(bus.clone());
        if let Some(base_url) = self.base_url {
            client = client.base_url(base_url);
        }
        if let Some(timeout) = self.timeout {
            client = client.timeout(timeout);
        }
        if let Some(timeout) = self.upload_timeout {
            client = client.upload_timeout(timeout);
        }
        if let Some(refresher) = &refresher {
            client = client.refresher(refresher.clone());
        }
        let client = client.build().context("Failed to build API client")?;

        Ok(Mantis {
            api: Arc::new(client),
            store,
            bus,
            refresher,
            turn: self.turn,
            documents: self.documents,
            threads: self.threads,
        })
    }
}

/// Configured client; hands out per-project coordinators
#[derive(Clone)]
pub struct Mantis {
    api: Arc<ApiClient>,
    store: Arc<dyn CredentialStore>,
    bus: SessionBus,
    refresher: Option<Arc<TokenRefreshCoordinator>>,
    turn: TurnConfig,
    documents: DocumentPollConfig,
    threads: ThreadPageConfig,
}

impl Mantis {
    pub fn builder() -> MantisBuilder {
        MantisBuilder::new()
    }

    pub fn client(&self) -> &ApiClient {
        &self.api
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn session_bus(&self) -> &SessionBus {
        &self.bus
    }

    pub fn refresher(&self) -> Option<&Arc<TokenRefreshCoordinator>> {
        self.refresher.as_ref()
    }

    pub fn chat(&self, scope: ProjectScope, user_id: impl Into<String>) -> ChatTurnCoordinator {
        ChatTurnCoordinator::new(
            scope,
            user_id,
            self.api.clone(),
            self.api.clone(),
            self.api.clone(),
            self.turn,
        )
    }

    pub fn runs(&self) -> RunOrchestrator {
        RunOrchestrator::new(self.api.clone(), self.turn.run)
    }

    pub fn threads(&self, scope: ProjectScope) -> ThreadBrowser {
        ThreadBrowser::new(self.api.clone(), scope, self.threads)
    }

    pub fn documents(&self, scope: ProjectScope) -> DocumentTracker {
        DocumentTracker::new(self.api.clone(), scope, self.documents)
    }

    pub fn teams(&self) -> TeamStore {
        TeamStore::new(self.api.clone())
    }

    pub fn projects(&self) -> ProjectStore {
        ProjectStore::new(self.api.clone())
    }

    pub fn auth(&self) -> AuthStore {
        AuthStore::new(ApiClient::clone(&self.api))
    }
}
