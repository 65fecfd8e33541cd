//! Shared database types for Motionbooth
//!
//! Store implementations report failures through `RepositoryError`;
//! handlers convert it into the common `Error`.

use crate::error::Error;
use thiserror::Error;

/// Store-specific error types
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Record already exists: {0}")]
    AlreadyExists(String),

    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<RepositoryError> for Error {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::AlreadyExists(what) => Error::Conflict(format!("{what} already exists")),
            RepositoryError::Connection(e) => Error::Database(e),
            RepositoryError::Unavailable(msg) => Error::ServiceUnavailable(msg),
            RepositoryError::InvalidData(msg) => Error::Internal(msg),
        }
    }
}
