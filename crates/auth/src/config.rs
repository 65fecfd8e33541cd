//! Authentication configuration

/// Header carrying the shared API credential
pub const API_KEY_HEADER: &str = "x-api-key";

/// Authentication configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub api_key: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
