use std::fmt;

/// Fixed keys the client persists its session under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// Bearer token issued by the backend
    AuthToken,
    /// JSON-encoded profile of the signed-in user
    User,
    /// Token issued by the identity provider, refreshed independently
    IdentityToken,
    IdentityRefreshToken,
}

impl StorageKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::AuthToken => "authToken",
            StorageKey::User => "user",
            StorageKey::IdentityToken => "auth0_id_token",
            StorageKey::IdentityRefreshToken => "auth0_refresh_token",
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
