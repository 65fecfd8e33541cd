//! Authentication errors

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Why a request was refused before reaching its handler
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("X-API-Key header required")]
    MissingApiKey,

    #[error("Invalid X-API-Key header format")]
    InvalidApiKeyFormat,

    #[error("Could not validate API key")]
    InvalidApiKey,
}

impl AuthError {
    /// Machine-readable code for the error body
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingApiKey => "MISSING_API_KEY",
            AuthError::InvalidApiKeyFormat | AuthError::InvalidApiKey => "INVALID_API_KEY",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        }));

        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}
