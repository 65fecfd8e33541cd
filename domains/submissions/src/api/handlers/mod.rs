//! HTTP handlers for the Submissions domain

pub mod generation;
pub mod moderation;
pub mod prompts;
pub mod submissions;

use std::collections::HashMap;
use std::time::Duration;

use axum::extract::Multipart;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use motionbooth_common::{Error, Result};
use motionbooth_storage::AssetGateway;

use crate::domain::entities::{Submission, SubmissionStatus};

/// Full submission view for moderators
#[derive(Debug, Serialize)]
pub struct SubmissionDetailResponse {
    pub id: Uuid,
    pub submission_code: String,
    pub status: SubmissionStatus,
    pub photo_url: Option<String>,
    pub video_url: Option<String>,
    pub user_prompt: Option<String>,
    pub user_name: Option<String>,
    pub email: Option<String>,
    pub error_message: Option<String>,
    pub moderation_comment: Option<String>,
    pub photo_moderated_at: Option<DateTime<Utc>>,
    pub video_moderated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubmissionDetailResponse {
    /// Build the view, signing the photo and any video
    pub async fn render(submission: Submission, assets: &dyn AssetGateway, ttl: Duration) -> Self {
        let photo_url = assets.signed_url(&submission.photo_ref, ttl).await;
        let video_url = match &submission.video_ref {
            Some(video_ref) => assets.signed_url(video_ref, ttl).await,
            None => None,
        };

        Self {
            id: submission.id,
            submission_code: submission.submission_code,
            status: submission.status,
            photo_url,
            video_url,
            user_prompt: submission.user_prompt,
            user_name: submission.user_name,
            email: submission.email,
            error_message: submission.error_message,
            moderation_comment: submission.moderation_comment,
            photo_moderated_at: submission.photo_moderated_at,
            video_moderated_at: submission.video_moderated_at,
            created_at: submission.created_at,
            updated_at: submission.updated_at,
        }
    }
}

/// Uploaded photo part of a multipart form
#[derive(Debug)]
pub struct PhotoUpload {
    pub bytes: Vec<u8>,
    pub file_name: Option<String>,
    pub content_type: String,
}

/// Parsed multipart form: the `photo` file plus any text fields
#[derive(Debug, Default)]
pub struct UploadForm {
    pub photo: Option<PhotoUpload>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| Error::Validation(format!("Invalid multipart body: {}", e.body_text())))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "photo" {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Error::Validation(format!("Could not read photo: {}", e.body_text())))?;
                form.photo = Some(PhotoUpload {
                    bytes: bytes.to_vec(),
                    file_name,
                    content_type,
                });
            } else if !name.is_empty() {
                let text = field
                    .text()
                    .await
                    .map_err(|e| Error::Validation(format!("Could not read field '{}': {}", name, e.body_text())))?;
                form.fields.insert(name, text);
            }
        }

        Ok(form)
    }

    /// The photo part, which every upload endpoint requires
    pub fn require_photo(&mut self) -> Result<PhotoUpload> {
        let photo = self
            .photo
            .take()
            .ok_or_else(|| Error::Validation("A 'photo' file is required".to_string()))?;
        if photo.bytes.is_empty() {
            return Err(Error::Validation("Uploaded photo is empty".to_string()));
        }
        Ok(photo)
    }

    pub fn take_field(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }
}
