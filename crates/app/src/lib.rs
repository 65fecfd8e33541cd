//! Motionbooth application composition root
//!
//! Builds every adapter from the environment, wires the Submissions domain
//! over them, and exposes the router plus the shared HTTP layers the
//! binaries apply.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderName, HeaderValue, Method};
use anyhow::Context;
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;

use motionbooth_auth::{AuthBackend, AuthConfig, API_KEY_HEADER};
use motionbooth_common::Config;
use motionbooth_llm::{LlmConfig, LlmServiceFactory};
use motionbooth_storage::{AssetGatewayFactory, StorageConfig};
use motionbooth_submissions::{
    GenerationPolicy, InMemorySubmissionStore, PgSubmissionStore, StaleGenerationSweeper,
    SubmissionStore, SubmissionsSettings, SubmissionsState,
};
use motionbooth_tasks::{TaskConfig, TaskDispatcherFactory};
use motionbooth_videogen::{GenerationProviderFactory, ProviderConfig};

/// Largest request body accepted anywhere (photo uploads plus form overhead)
pub const MAX_REQUEST_BODY_BYTES: usize = 12 * 1024 * 1024;

/// Build the submission store selected by `STORE_PROVIDER`
pub async fn build_store(config: &Config) -> Result<Arc<dyn SubmissionStore>, anyhow::Error> {
    match config.store_provider.as_str() {
        "postgres" => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for the postgres store"))?;

            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(database_url)
                .await
                .map_err(|e| anyhow::anyhow!("Database connection failed: {}", e))?;
            tracing::info!("Database connection established");

            sqlx::migrate!("../../migrations").run(&pool).await?;
            tracing::info!("Database migrations applied");

            Ok(Arc::new(PgSubmissionStore::new(pool)))
        }
        "memory" => {
            tracing::warn!("Using in-memory submission store; records are lost on restart");
            Ok(Arc::new(InMemorySubmissionStore::new()))
        }
        other => anyhow::bail!(
            "Unknown store provider: {}. Supported providers: postgres, memory",
            other
        ),
    }
}

/// Create the Submissions domain state with every adapter taken from the environment
pub async fn build_state(config: &Config) -> Result<SubmissionsState, anyhow::Error> {
    let policy = GenerationPolicy::from_config(config);
    let sweep_threshold = StaleGenerationSweeper::threshold_for(&policy, config.sweep_safety_factor)
        .context(
            "POLLING_INTERVAL_SECONDS x MAX_POLLING_ATTEMPTS x SWEEP_SAFETY_FACTOR is out of range",
        )?;

    let task_config = TaskConfig::from_env()?;
    check_delivery_budget(&task_config, &policy)?;

    let store = build_store(config).await?;

    let assets = AssetGatewayFactory::create(StorageConfig::from_env()?).await?;
    let provider = GenerationProviderFactory::create(ProviderConfig::from_env()?)?;
    let tasks = TaskDispatcherFactory::create(task_config)?;
    let llm = LlmServiceFactory::create(LlmConfig::from_env()?)?;

    let auth = AuthBackend::new(AuthConfig {
        api_key: config.api_key.clone(),
    });

    let settings = SubmissionsSettings {
        policy,
        sweep_threshold,
        signed_url_ttl: Duration::from_secs(config.signed_url_ttl_seconds),
        prompt_theme: config.prompt_theme.clone(),
    };

    tracing::info!(
        poll_interval_secs = policy.poll_interval.as_secs(),
        max_polling_attempts = policy.max_polling_attempts,
        max_retries = policy.max_retries,
        sweep_threshold_secs = settings.sweep_threshold.as_secs(),
        "Generation policy configured"
    );

    Ok(SubmissionsState::new(
        store,
        Arc::from(assets),
        Arc::from(provider),
        Arc::from(tasks),
        Arc::from(llm),
        auth,
        settings,
    ))
}

/// The `http` dispatcher must deliver at least once past the last retry.
///
/// Deliveries carry counters `0..max_deliveries`, and a failure becomes
/// terminal only at counter `max_retries`. With fewer deliveries the last
/// failure is left in PENDING_GENERATION_RETRY with nothing queued.
pub fn check_delivery_budget(
    tasks: &TaskConfig,
    policy: &GenerationPolicy,
) -> Result<(), anyhow::Error> {
    if tasks.provider == "http" && tasks.max_deliveries <= policy.max_retries {
        anyhow::bail!(
            "TASKS_MAX_DELIVERIES ({}) must exceed GENERATION_MAX_RETRIES ({})",
            tasks.max_deliveries,
            policy.max_retries
        );
    }
    Ok(())
}

/// Refuse dispatchers whose redeliveries run as in-process background tasks.
///
/// Lambda freezes the process once a response is sent, so a detached
/// delivery may never run.
pub fn ensure_serverless_dispatcher(tasks: &TaskConfig) -> Result<(), anyhow::Error> {
    if tasks.provider == "http" {
        anyhow::bail!(
            "TASKS_PROVIDER=http delivers from in-process background tasks and is not supported on Lambda; use inngest"
        );
    }
    Ok(())
}

/// Compose the domain router with shared infrastructure routes
pub fn create_router(state: SubmissionsState) -> Router {
    Router::new()
        .route("/health", axum::routing::get(health_check))
        .route(
            "/",
            axum::routing::get(|| async { "Motionbooth API v0.0.1-SNAPSHOT" }),
        )
        .merge(motionbooth_submissions::routes().with_state(state))
}

/// Create the main application router with all routes
pub async fn create_app(config: &Config) -> Result<Router, anyhow::Error> {
    let state = build_state(config).await?;
    Ok(create_router(state))
}

/// CORS for browser clients on the listed origins (comma-separated)
pub fn build_cors_layer(origins: &str) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %o, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(API_KEY_HEADER),
        ])
        .max_age(Duration::from_secs(3600))
}

/// Reject oversized request bodies before they reach a handler
pub fn body_limit_layer() -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
