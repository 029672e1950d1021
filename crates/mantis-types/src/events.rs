use serde::{Deserialize, Serialize};

/// App-wide signals broadcast independently of the component that raised them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A 401 was observed; stored credentials have already been cleared
    LoggedOut,
    /// Interactive login is required at the given authorize URL
    LoginRedirect { url: String },
    /// Last-resort navigation when the login redirect itself failed
    HardNavigate { path: String },
}
