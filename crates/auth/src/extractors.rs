//! Axum extractors for authentication
//!
//! Generic over any state `S` where `AuthBackend: FromRef<S>`.
//! This is axum's idiomatic nested-state pattern.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::backend::AuthBackend;
use crate::config::API_KEY_HEADER;
use crate::error::AuthError;

/// Marker extractor: the request carried the shared API key.
///
/// Put it first in a handler's argument list so rejection happens before any
/// body is read or any store is touched.
#[derive(Debug, Clone, Copy)]
pub struct ApiKeyAuth;

impl<S> FromRequestParts<S> for ApiKeyAuth
where
    AuthBackend: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let backend = AuthBackend::from_ref(state);

        let header = parts
            .headers
            .get(API_KEY_HEADER)
            .ok_or(AuthError::MissingApiKey)?;

        let presented = header
            .to_str()
            .map_err(|_| AuthError::InvalidApiKeyFormat)?
            .trim();

        if presented.is_empty() {
            return Err(AuthError::MissingApiKey);
        }

        backend.verify(presented)?;
        Ok(ApiKeyAuth)
    }
}
