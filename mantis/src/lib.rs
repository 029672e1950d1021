//! # Mantis
//!
//! Async client for the Agile Mantis project assistant.
//!
//! - **Chat turns** that either continue a historical thread through a run or
//!   talk to the chat endpoint directly
//! - **Run monitoring** with bounded, cancellable polling
//! - **Thread browsing** with cursor pagination
//! - **Document uploads** with progress and processing-status polling
//! - **Single-flight token refresh** against an OAuth identity provider
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mantis::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mantis = MantisBuilder::new()
//!         .base_url("https://mantis-api.azurewebsites.net/api")
//!         .credentials_file(".mantis/credentials.json")
//!         .build()?;
//!
//!     let chat = mantis.chat(ProjectScope::new("team-1", "project-1"), "user-1");
//!     chat.send_message("What is this project?").await?;
//!
//!     for message in &chat.state().borrow().messages {
//!         println!("{}", message.content);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **`mantis-types`**: domain model, reducers, polling configs, validation
//! - **`mantis-persist`**: persisted credentials behind `CredentialStore`
//! - **`mantis-client`**: HTTP adapter, error taxonomy, REST services, token refresh
//! - **`mantis-session`**: chat turns, run orchestration, threads, documents, stores

pub use mantis_client as client;
pub use mantis_persist as persist;
pub use mantis_session as session;
pub use mantis_types as types;

pub use mantis_client::{ApiClient, ApiError, OAuthConfig, SessionBus, TokenRefreshCoordinator, UploadFile};
pub use mantis_persist::{CredentialStore, FileStore, MemoryStore};
pub use mantis_session::{
    AuthStore, ChatTurnCoordinator, DocumentTracker, ProjectStore, RunOrchestrator, TeamStore, ThreadBrowser,
    TurnError, TurnOutcome,
};
pub use mantis_types::{
    ChatMessage, DocumentPollConfig, PollConfig, ProjectScope, SessionEvent, ThreadPageConfig, ThreadScope,
    TurnConfig,
};

/// High-level builder wiring storage, client and coordinators
pub mod builder;

pub use builder::{Mantis, MantisBuilder};

/// Convenient prelude with commonly used types
pub mod prelude {
    pub use crate::builder::{Mantis, MantisBuilder};
    pub use crate::client::{ApiError, OAuthConfig, UploadFile};
    pub use crate::session::{TurnError, TurnOutcome};
    pub use crate::types::{ChatMessage, ChatMessageType, ProjectScope, SessionEvent, ThreadScope};
    pub use anyhow::Result;
}
