//! Motionbooth Video Generation Provider
//!
//! Wraps an external long-running video job behind a uniform
//! submit/poll contract:
//! - HTTP provider speaking the `/v1/generate` + `/v1/jobs/{id}` API
//! - Mock provider with programmable outcomes for testing and development

pub mod http;
pub mod mock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider configuration error: {0}")]
    Configuration(String),

    #[error("Provider request error: {0}")]
    Request(String),

    #[error("Provider response error: {0}")]
    Response(String),
}

/// Opaque handle of a submitted job
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(pub String);

impl JobHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a single poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// Job accepted or still rendering
    Running,
    /// Job finished; the video lives at `asset_ref`
    Succeeded { asset_ref: String },
    /// Job finished without a video
    Failed { reason: String },
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

/// Generation provider configuration
#[derive(Clone)]
pub struct ProviderConfig {
    /// Provider backend (http, mock)
    pub provider: String,
    /// Base URL of the generation API
    pub base_url: String,
    /// Bearer token sent with every request
    pub api_key: Option<String>,
    /// Per-request timeout
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl ProviderConfig {
    /// Create provider config from environment variables
    pub fn from_env() -> Result<Self, ProviderError> {
        dotenvy::dotenv().ok();

        let provider = std::env::var("VIDEOGEN_PROVIDER").unwrap_or_else(|_| "mock".to_string());
        let base_url = std::env::var("VIDEOGEN_BASE_URL").unwrap_or_default();

        if provider == "http" && base_url.is_empty() {
            return Err(ProviderError::Configuration(
                "VIDEOGEN_BASE_URL is required for the http provider".to_string(),
            ));
        }

        let request_timeout_secs = match std::env::var("VIDEOGEN_REQUEST_TIMEOUT_SECONDS") {
            Ok(raw) => raw.trim().parse().map_err(|_| {
                ProviderError::Configuration(format!(
                    "VIDEOGEN_REQUEST_TIMEOUT_SECONDS must be a number, got '{raw}'"
                ))
            })?,
            Err(_) => 30,
        };

        Ok(Self {
            provider,
            base_url,
            api_key: std::env::var("VIDEOGEN_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            request_timeout_secs,
        })
    }
}

/// Long-running video generation backend
#[async_trait::async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Start a job for the photo at `photo_ref`.
    async fn submit(&self, photo_ref: &str, prompt: Option<&str>)
        -> Result<JobHandle, ProviderError>;

    /// Ask the backend where a job stands.
    async fn poll(&self, job: &JobHandle) -> Result<JobStatus, ProviderError>;
}

/// Factory for creating GenerationProvider implementations
pub struct GenerationProviderFactory;

impl GenerationProviderFactory {
    pub fn create(config: ProviderConfig) -> Result<Box<dyn GenerationProvider>, ProviderError> {
        match config.provider.as_str() {
            "http" => {
                tracing::info!(base_url = %config.base_url, "Creating HTTP generation provider");
                Ok(Box::new(http::HttpGenerationProvider::new(config)?))
            }
            "mock" => {
                tracing::info!("Creating mock generation provider");
                Ok(Box::new(mock::MockGenerationProvider::new()))
            }
            provider => Err(ProviderError::Configuration(format!(
                "Unknown generation provider: {}. Supported providers: http, mock",
                provider
            ))),
        }
    }
}
