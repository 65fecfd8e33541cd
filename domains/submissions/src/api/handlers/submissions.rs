//! Submission intake and end-user status handlers

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use motionbooth_auth::ApiKeyAuth;
use motionbooth_common::{Error, Pagination, Result, ValidatedJson};

use crate::api::middleware::SubmissionsState;
use crate::domain::entities::{
    generate_submission_code, normalize_prompt, photo_extension, photo_path,
    validate_photo_content_type, Submission, SubmissionStatus,
};

use super::UploadForm;

/// Response for a newly created submission
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSubmissionResponse {
    pub submission_code: String,
    pub status: SubmissionStatus,
    pub message: String,
}

/// Status filter shared by list and count
#[derive(Debug, Deserialize)]
pub struct StatusFilter {
    pub status: SubmissionStatus,
}

/// Listed submission
#[derive(Debug, Serialize)]
pub struct SubmissionListItem {
    pub id: Uuid,
    pub submission_code: String,
    pub status: SubmissionStatus,
    pub user_prompt: Option<String>,
    pub user_name: Option<String>,
    /// Signed URL of the approved video
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionCountResponse {
    pub status: SubmissionStatus,
    pub count: i64,
}

/// What the end user sees when checking a code
#[derive(Debug, Serialize)]
pub struct SubmissionStatusResponse {
    pub submission_code: String,
    pub status: SubmissionStatus,
    pub video_url: Option<String>,
    pub moderation_comment: Option<String>,
}

/// Request for replacing the generation prompt
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePromptRequest {
    #[validate(length(max = 2000))]
    pub user_prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdatePromptResponse {
    pub id: Uuid,
    pub status: SubmissionStatus,
    pub user_prompt: Option<String>,
}

/// Accept a photo (and optional prompt, name and email) for moderation
pub async fn create_submission(
    _auth: ApiKeyAuth,
    State(state): State<SubmissionsState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<CreateSubmissionResponse>)> {
    let mut form = UploadForm::read(multipart).await?;
    let photo = form.require_photo()?;
    validate_photo_content_type(&photo.content_type)?;

    let code = generate_submission_code();
    let extension = photo_extension(photo.file_name.as_deref(), &photo.content_type);
    let path = photo_path(&code, &extension);

    // Validates prompt and email before anything is uploaded
    let mut submission = Submission::new(
        code,
        path.clone(),
        form.take_field("user_prompt"),
        form.take_field("user_name"),
        form.take_field("email"),
    )?;

    submission.photo_ref = state
        .assets
        .upload(photo.bytes, &path, &photo.content_type)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, path = %path, "Photo upload failed");
            Error::ServiceUnavailable(format!("Photo upload failed: {}", e))
        })?;

    // No record points at the uploaded photo if this fails
    let created = state.store.create(&submission).await.map_err(|e| {
        tracing::error!(
            error = %e,
            submission_code = %submission.submission_code,
            orphaned_photo = %submission.photo_ref,
            orphaned_path = %path,
            "Failed to record submission; uploaded photo is orphaned"
        );
        e
    })?;

    tracing::info!(
        submission_id = %created.id,
        submission_code = %created.submission_code,
        "Submission received"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateSubmissionResponse {
            submission_code: created.submission_code,
            status: created.status,
            message: "Submission received and is pending photo approval.".to_string(),
        }),
    ))
}

/// List submissions in one status, oldest first
pub async fn list_submissions(
    _auth: ApiKeyAuth,
    State(state): State<SubmissionsState>,
    Query(filter): Query<StatusFilter>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<SubmissionListItem>>> {
    let submissions = state
        .store
        .list_by_status(filter.status, page.offset(), page.limit())
        .await?;

    let mut items = Vec::with_capacity(submissions.len());
    for s in submissions {
        let video_url = match (&s.status, &s.video_ref) {
            (SubmissionStatus::VideoApproved, Some(video_ref)) => {
                state.assets.signed_url(video_ref, state.signed_url_ttl).await
            }
            _ => None,
        };
        items.push(SubmissionListItem {
            id: s.id,
            submission_code: s.submission_code,
            status: s.status,
            user_prompt: s.user_prompt,
            user_name: s.user_name,
            video_url,
            created_at: s.created_at,
            updated_at: s.updated_at,
        });
    }

    Ok(Json(items))
}

pub async fn count_submissions(
    _auth: ApiKeyAuth,
    State(state): State<SubmissionsState>,
    Query(filter): Query<StatusFilter>,
) -> Result<Json<SubmissionCountResponse>> {
    let count = state.store.count_by_status(filter.status).await?;
    Ok(Json(SubmissionCountResponse {
        status: filter.status,
        count,
    }))
}

/// Public status lookup by submission code
pub async fn get_submission_status(
    State(state): State<SubmissionsState>,
    Path(code): Path<String>,
) -> Result<Json<SubmissionStatusResponse>> {
    let submission = state
        .store
        .get_by_code(&code)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Submission code '{}' not found", code)))?;

    let video_url = match (&submission.status, &submission.video_ref) {
        (SubmissionStatus::VideoApproved, Some(video_ref)) => {
            state.assets.signed_url(video_ref, state.signed_url_ttl).await
        }
        _ => None,
    };

    let moderation_comment = match submission.status {
        SubmissionStatus::PhotoRejected | SubmissionStatus::VideoRejected => {
            submission.moderation_comment
        }
        _ => None,
    };

    Ok(Json(SubmissionStatusResponse {
        submission_code: submission.submission_code,
        status: submission.status,
        video_url,
        moderation_comment,
    }))
}

/// Replace the prompt while generation has not started
pub async fn update_submission_prompt(
    _auth: ApiKeyAuth,
    State(state): State<SubmissionsState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdatePromptRequest>,
) -> Result<Json<UpdatePromptResponse>> {
    let prompt = normalize_prompt(req.user_prompt)?;

    if !state.store.update_prompt(id, prompt).await? {
        let current = state
            .store
            .get_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Submission {} not found", id)))?;
        return Err(Error::Conflict(format!(
            "Prompt can no longer be changed: submission is {}",
            current.status
        )));
    }

    let updated = state
        .store
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Submission {} not found", id)))?;

    Ok(Json(UpdatePromptResponse {
        id: updated.id,
        status: updated.status,
        user_prompt: updated.user_prompt,
    }))
}
