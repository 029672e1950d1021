//! Backend access for the Agile Mantis client
//!
//! [`ApiClient`] is the single HTTP adapter. Resource services are methods on
//! it; the ones the session layer orchestrates are exposed through the traits
//! in [`traits`] so they can be faked.

pub mod envelope;
pub mod error;
pub mod http;
pub mod identity;
pub mod refresh;
pub mod services;
pub mod session_bus;
pub mod traits;
pub mod upload;

pub use error::{ApiError, ErrorContext, RefreshError, Result};
pub use http::{ApiClient, ApiClientBuilder};
pub use identity::{IdentityProvider, OAuthConfig, OAuthIdentityProvider};
pub use refresh::TokenRefreshCoordinator;
pub use session_bus::SessionBus;
pub use traits::{ChatApi, DocumentsApi, ProjectsApi, RunsApi, TeamsApi, ThreadsApi};
pub use upload::{ProgressCallback, UploadFile, UploadProgress};
