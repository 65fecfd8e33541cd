//! Authentication for the Motionbooth API
//!
//! A single shared credential gates every mutating endpoint. The `ApiKeyAuth`
//! extractor works with any domain state implementing `FromRef<S>` for
//! `AuthBackend`, and rejects the request before the handler body runs.

mod backend;
mod config;
mod error;
mod extractors;

pub use backend::AuthBackend;
pub use config::{AuthConfig, API_KEY_HEADER};
pub use error::AuthError;
pub use extractors::ApiKeyAuth;
