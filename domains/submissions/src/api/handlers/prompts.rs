//! Prompt assistance handlers

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;

use motionbooth_auth::ApiKeyAuth;
use motionbooth_common::{Error, Result};

use crate::api::middleware::SubmissionsState;

use super::UploadForm;

#[derive(Debug, Serialize)]
pub struct PromptSuggestionsResponse {
    pub prompts: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PromptDraftResponse {
    pub prompt: String,
}

/// Suggest generation prompts for an uploaded photo
pub async fn suggest_prompts(
    _auth: ApiKeyAuth,
    State(state): State<SubmissionsState>,
    multipart: Multipart,
) -> Result<Json<PromptSuggestionsResponse>> {
    let mut form = UploadForm::read(multipart).await?;
    let photo = form.require_photo()?;

    let prompts = state
        .prompts
        .suggest(&photo.bytes, &photo.content_type)
        .await?;

    Ok(Json(PromptSuggestionsResponse { prompts }))
}

/// Rewrite the user's text into a generation prompt for the photo
pub async fn draft_prompt(
    _auth: ApiKeyAuth,
    State(state): State<SubmissionsState>,
    multipart: Multipart,
) -> Result<Json<PromptDraftResponse>> {
    let mut form = UploadForm::read(multipart).await?;
    let photo = form.require_photo()?;
    let text = form
        .take_field("text")
        .ok_or_else(|| Error::Validation("A 'text' field is required".to_string()))?;

    let prompt = state
        .prompts
        .draft(&photo.bytes, &photo.content_type, &text)
        .await?;

    Ok(Json(PromptDraftResponse { prompt }))
}
