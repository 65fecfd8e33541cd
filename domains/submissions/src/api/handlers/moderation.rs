//! Moderation queue and decision handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use motionbooth_auth::ApiKeyAuth;
use motionbooth_common::{Error, Pagination, Result, ValidatedJson};

use crate::api::middleware::SubmissionsState;
use crate::domain::entities::SubmissionStatus;
use crate::services::moderation::Decision;

use super::SubmissionDetailResponse;

/// Moderator verdict on a photo or a video
#[derive(Debug, Deserialize, Validate)]
pub struct ModerationActionRequest {
    pub decision: Decision,
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}

async fn list_in_status(
    state: &SubmissionsState,
    status: SubmissionStatus,
    page: Pagination,
) -> Result<Vec<SubmissionDetailResponse>> {
    let submissions = state
        .store
        .list_by_status(status, page.offset(), page.limit())
        .await?;

    let mut details = Vec::with_capacity(submissions.len());
    for submission in submissions {
        details.push(
            SubmissionDetailResponse::render(submission, state.assets.as_ref(), state.signed_url_ttl)
                .await,
        );
    }
    Ok(details)
}

/// Photos waiting for a decision, oldest first
pub async fn list_pending_photos(
    _auth: ApiKeyAuth,
    State(state): State<SubmissionsState>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<SubmissionDetailResponse>>> {
    Ok(Json(
        list_in_status(&state, SubmissionStatus::PendingPhotoApproval, page).await?,
    ))
}

/// Generated videos waiting for a decision, oldest first
pub async fn list_pending_videos(
    _auth: ApiKeyAuth,
    State(state): State<SubmissionsState>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<SubmissionDetailResponse>>> {
    Ok(Json(
        list_in_status(&state, SubmissionStatus::PendingVideoApproval, page).await?,
    ))
}

pub async fn get_submission_detail(
    _auth: ApiKeyAuth,
    State(state): State<SubmissionsState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SubmissionDetailResponse>> {
    let submission = state
        .store
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Submission {} not found", id)))?;

    Ok(Json(
        SubmissionDetailResponse::render(submission, state.assets.as_ref(), state.signed_url_ttl)
            .await,
    ))
}

pub async fn moderate_photo(
    _auth: ApiKeyAuth,
    State(state): State<SubmissionsState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<ModerationActionRequest>,
) -> Result<StatusCode> {
    state
        .moderation
        .decide_photo(id, req.decision, req.comment)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn moderate_video(
    _auth: ApiKeyAuth,
    State(state): State<SubmissionsState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<ModerationActionRequest>,
) -> Result<StatusCode> {
    state
        .moderation
        .decide_video(id, req.decision, req.comment)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Queue another generation task (recovery after a failed enqueue)
pub async fn retry_generation(
    _auth: ApiKeyAuth,
    State(state): State<SubmissionsState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.moderation.retry_generation(id).await?;
    Ok(StatusCode::ACCEPTED)
}
