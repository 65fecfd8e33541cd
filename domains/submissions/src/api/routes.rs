//! Route definitions for Submissions domain API

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use super::handlers::{generation, moderation, prompts, submissions};
use super::middleware::SubmissionsState;

/// Largest accepted photo upload (multipart body)
pub const MAX_PHOTO_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Create all Submissions domain API routes
pub fn routes() -> Router<SubmissionsState> {
    Router::new()
        .route(
            "/submissions",
            post(submissions::create_submission)
                .layer(DefaultBodyLimit::max(MAX_PHOTO_UPLOAD_BYTES))
                .get(submissions::list_submissions),
        )
        .route("/submissions/count", get(submissions::count_submissions))
        // Same segment name as the prompt route; this one carries the public code
        .route(
            "/submissions/{id}/status",
            get(submissions::get_submission_status),
        )
        .route(
            "/submissions/{id}/prompt",
            put(submissions::update_submission_prompt),
        )
        .route(
            "/moderation/pending_photos",
            get(moderation::list_pending_photos),
        )
        .route(
            "/moderation/pending_videos",
            get(moderation::list_pending_videos),
        )
        .route(
            "/moderation/submissions/{id}",
            get(moderation::get_submission_detail),
        )
        .route(
            "/moderation/photos/{id}/action",
            post(moderation::moderate_photo),
        )
        .route(
            "/moderation/videos/{id}/action",
            post(moderation::moderate_video),
        )
        .route(
            "/moderation/retry_generation/{id}",
            post(moderation::retry_generation),
        )
        .route("/generation/{id}", post(generation::run_generation_task))
        .route("/internal/sweep", post(generation::sweep_stale_generations))
        .route(
            "/prompts/suggestions",
            post(prompts::suggest_prompts).layer(DefaultBodyLimit::max(MAX_PHOTO_UPLOAD_BYTES)),
        )
        .route(
            "/prompts/draft",
            post(prompts::draft_prompt).layer(DefaultBodyLimit::max(MAX_PHOTO_UPLOAD_BYTES)),
        )
}
