//! Shared utilities, configuration, and error handling for Motionbooth
//!
//! This crate provides common functionality used across the Motionbooth services:
//! - Configuration management following 12-factor principles
//! - Error types and their HTTP mapping
//! - Pagination and validated JSON extractors
//! - Constant-time secret comparison

pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod extractors;
pub mod state;

pub use config::Config;
pub use crypto::secrets_match;
pub use db::RepositoryError;
pub use error::{Error, Result};
pub use extractors::{Pagination, ValidatedJson};
pub use state::StateError;
