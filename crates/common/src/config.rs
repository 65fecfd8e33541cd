//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config. Adapter crates (storage,
//! videogen, tasks, llm) read their own provider settings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Submission store backend (postgres, memory)
    pub store_provider: String,
    /// Database connection URL, required for the postgres store
    pub database_url: Option<String>,

    /// Shared credential expected in the `X-API-Key` header
    pub api_key: String,

    /// Lifetime of signed asset URLs handed to clients
    pub signed_url_ttl_seconds: u64,

    /// Generation polling and retry policy
    pub polling_interval_seconds: u64,
    pub max_polling_attempts: u32,
    pub generation_max_retries: u32,

    /// Stale generation sweep
    pub sweep_safety_factor: u32,
    pub sweep_interval_seconds: u64,

    /// Theme steering prompt suggestions
    pub prompt_theme: String,

    /// Comma-separated list of allowed CORS origins (Lambda only)
    pub cors_allowed_origins: Option<String>,

    /// Runtime configuration
    pub rust_log: String,
    pub port: u16,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("store_provider", &self.store_provider)
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .field("api_key", &"[REDACTED]")
            .field("signed_url_ttl_seconds", &self.signed_url_ttl_seconds)
            .field("polling_interval_seconds", &self.polling_interval_seconds)
            .field("max_polling_attempts", &self.max_polling_attempts)
            .field("generation_max_retries", &self.generation_max_retries)
            .field("sweep_safety_factor", &self.sweep_safety_factor)
            .field("sweep_interval_seconds", &self.sweep_interval_seconds)
            .field("prompt_theme", &self.prompt_theme)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("rust_log", &self.rust_log)
            .field("port", &self.port)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let store_provider =
            env::var("STORE_PROVIDER").unwrap_or_else(|_| "postgres".to_string());
        let database_url = env::var("DATABASE_URL").ok();
        if store_provider == "postgres" && database_url.is_none() {
            anyhow::bail!("DATABASE_URL is required for the postgres store");
        }

        let api_key = env::var("API_KEY").map_err(|_| anyhow::anyhow!("API_KEY is required"))?;
        if api_key.trim().is_empty() {
            anyhow::bail!("API_KEY must not be empty");
        }

        let config = Self {
            store_provider,
            database_url,
            api_key,

            signed_url_ttl_seconds: parse_or("SIGNED_URL_TTL_SECONDS", 3600)?,

            polling_interval_seconds: parse_or("POLLING_INTERVAL_SECONDS", 15)?,
            max_polling_attempts: parse_or("MAX_POLLING_ATTEMPTS", 80)?,
            generation_max_retries: parse_or("GENERATION_MAX_RETRIES", 3)?,

            sweep_safety_factor: parse_or("SWEEP_SAFETY_FACTOR", 2)?,
            sweep_interval_seconds: parse_or("SWEEP_INTERVAL_SECONDS", 300)?,

            prompt_theme: env::var("PROMPT_THEME").unwrap_or_else(|_| "Travel".to_string()),

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS").ok(),

            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "motionbooth=debug".to_string()),
            port: parse_or("PORT", 3000)?,
        };

        Ok(config)
    }
}

/// Read `key` and parse it, falling back to `default` when unset.
fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
