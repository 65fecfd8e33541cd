//! Motionbooth Task Dispatcher
//!
//! Enqueues generation tasks addressed at the generation task handler:
//! - HTTP push delivery with redelivery on failure (at-least-once)
//! - Inngest event API integration
//! - Mock dispatcher for testing and development

pub mod http;
pub mod inngest;
pub mod mock;

use thiserror::Error;
use uuid::Uuid;

/// Header carrying the zero-based redelivery counter on each delivery
pub const RETRY_COUNT_HEADER: &str = "x-task-retry-count";

/// Event name published for each generation request
pub const GENERATION_REQUESTED_EVENT: &str = "motionbooth/generation.requested";

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Task configuration error: {0}")]
    Configuration(String),

    #[error("Task request error: {0}")]
    Request(String),

    #[error("Task response error: {0}")]
    Response(String),
}

/// Task dispatcher configuration
#[derive(Clone)]
pub struct TaskConfig {
    /// Dispatcher backend (http, inngest, mock)
    pub provider: String,
    /// Base URL serving `POST /generation/{id}`
    pub target_base_url: String,
    /// Credential sent as `X-API-Key` on push deliveries
    pub api_key: Option<String>,
    /// Total delivery attempts per task, first delivery included
    pub max_deliveries: u32,
    /// Delay before the first redelivery; doubles on each further attempt
    pub initial_backoff_ms: u64,
    /// Inngest event key
    pub inngest_event_key: String,
    /// Inngest event API base URL
    pub inngest_base_url: String,
}

impl std::fmt::Debug for TaskConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskConfig")
            .field("provider", &self.provider)
            .field("target_base_url", &self.target_base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("max_deliveries", &self.max_deliveries)
            .field("initial_backoff_ms", &self.initial_backoff_ms)
            .field("inngest_event_key", &"[REDACTED]")
            .field("inngest_base_url", &self.inngest_base_url)
            .finish()
    }
}

impl TaskConfig {
    /// Create task config from environment variables
    pub fn from_env() -> Result<Self, TaskError> {
        dotenvy::dotenv().ok();

        let provider = std::env::var("TASKS_PROVIDER").unwrap_or_else(|_| "mock".to_string());

        let target_base_url = std::env::var("TASKS_TARGET_BASE_URL").unwrap_or_else(|_| {
            let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
            format!("http://localhost:{}", port)
        });

        let max_deliveries = parse_or("TASKS_MAX_DELIVERIES", 4)?;
        if max_deliveries == 0 {
            return Err(TaskError::Configuration(
                "TASKS_MAX_DELIVERIES must be at least 1".to_string(),
            ));
        }

        let inngest_event_key = std::env::var("INNGEST_EVENT_KEY").unwrap_or_default();
        if provider == "inngest" && inngest_event_key.is_empty() {
            return Err(TaskError::Configuration(
                "INNGEST_EVENT_KEY is required for the inngest provider".to_string(),
            ));
        }

        Ok(Self {
            provider,
            target_base_url,
            api_key: std::env::var("API_KEY").ok(),
            max_deliveries,
            initial_backoff_ms: parse_or("TASKS_INITIAL_BACKOFF_MS", 10_000)?,
            inngest_event_key,
            inngest_base_url: std::env::var("INNGEST_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8288".to_string()),
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, TaskError> {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| {
            TaskError::Configuration(format!("{key} must be a valid number, got '{raw}'"))
        }),
        Err(_) => Ok(default),
    }
}

/// Queue front door for generation tasks
#[async_trait::async_trait]
pub trait TaskDispatcher: Send + Sync {
    /// Schedule one generation task for `submission_id`.
    ///
    /// Delivery is at-least-once: the handler may run more than once, late,
    /// or concurrently for the same id.
    async fn enqueue(&self, submission_id: Uuid) -> Result<(), TaskError>;
}

/// Factory for creating TaskDispatcher implementations
pub struct TaskDispatcherFactory;

impl TaskDispatcherFactory {
    pub fn create(config: TaskConfig) -> Result<Box<dyn TaskDispatcher>, TaskError> {
        match config.provider.as_str() {
            "http" => {
                tracing::info!(target = %config.target_base_url, "Creating HTTP task dispatcher");
                Ok(Box::new(http::HttpTaskDispatcher::new(config)?))
            }
            "inngest" => {
                tracing::info!("Creating Inngest task dispatcher");
                if config.inngest_event_key.is_empty() {
                    return Err(TaskError::Configuration(
                        "INNGEST_EVENT_KEY is required for the inngest provider".to_string(),
                    ));
                }
                Ok(Box::new(inngest::InngestDispatcher::new(config)))
            }
            "mock" => {
                tracing::info!("Creating mock task dispatcher");
                Ok(Box::new(mock::MockTaskDispatcher::new()))
            }
            provider => Err(TaskError::Configuration(format!(
                "Unknown task provider: {}. Supported providers: http, inngest, mock",
                provider
            ))),
        }
    }
}
