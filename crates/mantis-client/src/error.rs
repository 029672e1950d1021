use mantis_persist::StoreError;
use serde_json::Value;
use thiserror::Error;

pub const NETWORK_ERROR_CODE: &str = "NETWORK_ERROR";
pub const SETUP_ERROR_CODE: &str = "SETUP_ERROR";

/// Every failure the backend adapter and the polling loops can surface
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// 401; stored credentials were cleared and a logout broadcast
    #[error("{message}")]
    Authentication { message: String },

    #[error("{message}")]
    Permission { message: String },

    #[error("{message}")]
    NotFound { message: String },

    /// 400: the request or message was malformed
    #[error("{message}")]
    Validation { message: String, details: Option<Value> },

    #[error("{message}")]
    Server {
        status: u16,
        code: Option<String>,
        message: String,
        details: Option<Value>,
    },

    /// Request was sent but no response came back
    #[error("{message}")]
    Network { message: String },

    /// Request never left the client
    #[error("{message}")]
    Setup { message: String },

    /// Polling ran out of attempts or wall-clock budget
    #[error("{0}")]
    Timeout(String),

    #[error("Invalid response format: {detail}")]
    InvalidResponseFormat { detail: String },

    #[error("Run failed: {run_id}")]
    RunFailed { run_id: String },

    #[error("Run expired before completion")]
    RunExpired { run_id: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Identity provider error: {0}")]
    Identity(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Storage(e.to_string())
    }
}

impl ApiError {
    pub fn invalid_format(detail: impl Into<String>) -> Self {
        ApiError::InvalidResponseFormat { detail: detail.into() }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Authentication { .. } => Some(401),
            ApiError::Permission { .. } => Some(403),
            ApiError::NotFound { .. } => Some(404),
            ApiError::Validation { .. } => Some(400),
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::Server { code, .. } => code.as_deref(),
            ApiError::Network { .. } => Some(NETWORK_ERROR_CODE),
            ApiError::Setup { .. } => Some(SETUP_ERROR_CODE),
            _ => None,
        }
    }

    /// Only network failures are retried by polling loops
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network { .. })
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Per-operation wording applied on top of the adapter's classification
///
/// The variant is kept so callers can still branch on the category; only the
/// user-facing message changes.
#[derive(Debug, Clone, Copy)]
pub struct ErrorContext {
    pub operation: &'static str,
    pub bad_request: Option<&'static str>,
    pub unauthorized: Option<&'static str>,
    pub forbidden: &'static str,
    pub not_found: &'static str,
}

impl ErrorContext {
    pub fn apply(&self, err: ApiError) -> ApiError {
        match err {
            ApiError::Validation { message, details } => ApiError::Validation {
                message: match self.bad_request {
                    Some(text) => text.to_string(),
                    None => format!("Invalid request: {message}"),
                },
                details,
            },
            ApiError::Authentication { message } => ApiError::Authentication {
                message: self.unauthorized.map(str::to_string).unwrap_or(message),
            },
            ApiError::Permission { .. } => ApiError::Permission {
                message: self.forbidden.to_string(),
            },
            ApiError::NotFound { .. } => ApiError::NotFound {
                message: self.not_found.to_string(),
            },
            ApiError::Server {
                status,
                code,
                message,
                details,
            } => ApiError::Server {
                status,
                code,
                message: format!("Failed to {}: {message}", self.operation),
                details,
            },
            ApiError::Network { .. } => ApiError::Network {
                message: "Network error: Unable to connect to the server".to_string(),
            },
            ApiError::Setup { message } => ApiError::Setup {
                message: format!("Request failed: {message}"),
            },
            other => other,
        }
    }
}

/// Outcome shared by every waiter of one token refresh
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    #[error("Token refresh failed: {0}")]
    Failed(String),

    #[error("No identity provider is configured")]
    Unavailable,

    #[error("Token refresh was abandoned before it completed")]
    Abandoned,
}

impl From<RefreshError> for ApiError {
    fn from(e: RefreshError) -> Self {
        ApiError::Identity(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUNS: ErrorContext = ErrorContext {
        operation: "create run",
        bad_request: None,
        unauthorized: Some("You must be logged in to create runs"),
        forbidden: "You do not have permission to create runs in this thread",
        not_found: "Thread not found or you do not have access to it",
    };

    #[test]
    fn test_context_rewrites_messages_but_keeps_category() {
        let err = RUNS.apply(ApiError::NotFound {
            message: "Not Found".into(),
        });
        assert!(matches!(err, ApiError::NotFound { .. }));
        assert_eq!(err.to_string(), "Thread not found or you do not have access to it");

        let err = RUNS.apply(ApiError::Validation {
            message: "message is required".into(),
            details: None,
        });
        assert_eq!(err.to_string(), "Invalid request: message is required");
    }

    #[test]
    fn test_context_fallbacks() {
        let err = RUNS.apply(ApiError::Server {
            status: 500,
            code: None,
            message: "boom".into(),
            details: None,
        });
        assert_eq!(err.to_string(), "Failed to create run: boom");
        assert_eq!(err.status(), Some(500));

        let err = RUNS.apply(ApiError::Network {
            message: "Network error - please check your connection".into(),
        });
        assert!(err.is_network());
        assert_eq!(err.code(), Some(NETWORK_ERROR_CODE));
        assert_eq!(err.to_string(), "Network error: Unable to connect to the server");

        let err = RUNS.apply(ApiError::invalid_format("missing runId"));
        assert_eq!(err.to_string(), "Invalid response format: missing runId");
    }
}
