//! Concrete authentication backend
//!
//! Holds the configured credential and checks presented keys against it.

use std::sync::Arc;

use motionbooth_common::secrets_match;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// Authentication backend shared by all domain states.
///
/// Domain states expose this via `FromRef`:
/// ```ignore
/// impl FromRef<MyDomainState> for AuthBackend {
///     fn from_ref(state: &MyDomainState) -> Self {
///         state.auth.clone()
///     }
/// }
/// ```
#[derive(Clone, Debug)]
pub struct AuthBackend {
    config: Arc<AuthConfig>,
}

impl AuthBackend {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Check a presented key against the configured credential.
    pub fn verify(&self, presented: &str) -> Result<(), AuthError> {
        if secrets_match(presented, &self.config.api_key) {
            Ok(())
        } else {
            tracing::warn!("Rejected request with invalid API key");
            Err(AuthError::InvalidApiKey)
        }
    }
}
