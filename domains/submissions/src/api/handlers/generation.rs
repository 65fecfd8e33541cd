//! Task delivery target and sweep trigger
//!
//! The delivery mechanism reads only the status code: 2xx acknowledges the
//! task, anything else asks for redelivery.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use motionbooth_auth::ApiKeyAuth;
use motionbooth_common::Result;
use motionbooth_tasks::RETRY_COUNT_HEADER;

use crate::api::middleware::SubmissionsState;
use crate::services::generation::TaskOutcome;
use crate::services::sweep::SweepReport;

/// Retry counter header set by Google Cloud Tasks
pub const CLOUD_TASKS_RETRY_HEADER: &str = "x-cloudtasks-taskretrycount";

#[derive(Debug, Serialize)]
pub struct GenerationTaskResponse {
    pub submission_id: Uuid,
    pub redeliver: bool,
    #[serde(flatten)]
    pub outcome: TaskOutcome,
}

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub swept: usize,
    #[serde(flatten)]
    pub report: SweepReport,
}

/// Redelivery counter of the current delivery; missing or garbled means 0
pub fn redelivery_count(headers: &HeaderMap) -> u32 {
    [RETRY_COUNT_HEADER, CLOUD_TASKS_RETRY_HEADER]
        .iter()
        .find_map(|name| headers.get(*name))
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0)
}

/// Run one delivery of the generation task
pub async fn run_generation_task(
    _auth: ApiKeyAuth,
    State(state): State<SubmissionsState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<GenerationTaskResponse>)> {
    let count = redelivery_count(&headers);

    let outcome = state.generation.handle(id, count).await.map_err(|e| {
        tracing::error!(
            error = %e,
            submission_id = %id,
            redelivery_count = count,
            transient = e.is_transient(),
            "Generation task failed, requesting redelivery"
        );
        e
    })?;

    let redeliver = outcome.should_redeliver();
    let status = if redeliver {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(GenerationTaskResponse {
            submission_id: id,
            redeliver,
            outcome,
        }),
    ))
}

/// Recover submissions whose generation task was lost or died mid-poll
pub async fn sweep_stale_generations(
    _auth: ApiKeyAuth,
    State(state): State<SubmissionsState>,
) -> Result<Json<SweepResponse>> {
    let report = state.sweeper.sweep().await?;
    Ok(Json(SweepResponse {
        swept: report.total(),
        report,
    }))
}
