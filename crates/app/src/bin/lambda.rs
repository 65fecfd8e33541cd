//! Motionbooth API - AWS Lambda Runtime
//!
//! The stale generation sweep is not scheduled here; a scheduled rule
//! calls `POST /internal/sweep` instead. The in-process `http` task
//! dispatcher is refused: its deliveries would be frozen with the
//! invocation that spawned them.

use lambda_http::{run, Error};
use tower_http::trace::TraceLayer;
use tracing::info;

use motionbooth_app::{
    body_limit_layer, build_cors_layer, create_app, ensure_serverless_dispatcher,
};
use motionbooth_common::config::Config;
use motionbooth_tasks::TaskConfig;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .without_time()
        .init();

    info!("Initializing Motionbooth API Lambda");

    let config =
        Config::from_env().map_err(|e| Error::from(format!("Configuration error: {}", e)))?;

    let tasks = TaskConfig::from_env()
        .map_err(|e| Error::from(format!("Configuration error: {}", e)))?;
    ensure_serverless_dispatcher(&tasks)
        .map_err(|e| Error::from(format!("Configuration error: {}", e)))?;

    let app = create_app(&config)
        .await
        .map_err(|e| Error::from(format!("App initialization error: {}", e)))?;

    let cors_origins = config
        .cors_allowed_origins
        .clone()
        .ok_or_else(|| Error::from("CORS_ALLOWED_ORIGINS environment variable is required"))?;

    let app = app
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(&cors_origins))
        .layer(body_limit_layer());

    info!("Motionbooth API Lambda ready to serve requests");

    run(app).await
}
