//! Submission domain entities
//!
//! The submission record, its persisted status enum, the auxiliary field
//! updates a transition may carry, and photo upload rules.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::ValidateEmail;

use motionbooth_common::{Error, Result};

use crate::domain::state::{SubmissionEvent, SubmissionState};

/// Length of the public submission code
pub const SUBMISSION_CODE_LENGTH: usize = 10;

/// URL-safe alphabet without look-alike characters (0/O, 1/I/l)
const CODE_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Accepted photo content types
pub const ALLOWED_PHOTO_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

const ALLOWED_PHOTO_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".webp"];

pub const MAX_PROMPT_LENGTH: usize = 2000;

/// Persisted submission status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "submission_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    #[default]
    PendingPhotoApproval,
    PhotoApproved,
    PhotoRejected,
    GeneratingVideo,
    PendingGenerationRetry,
    GenerationFailed,
    PendingVideoApproval,
    VideoApproved,
    VideoRejected,
}

impl SubmissionStatus {
    #[mutants::skip] // Delegates to SubmissionState::is_terminal()
    pub fn is_terminal(&self) -> bool {
        self.to_state().is_terminal()
    }

    #[mutants::skip] // Delegates to SubmissionState::is_pre_generation()
    pub fn is_pre_generation(&self) -> bool {
        self.to_state().is_pre_generation()
    }

    /// Convert to state machine state
    pub fn to_state(&self) -> SubmissionState {
        match self {
            Self::PendingPhotoApproval => SubmissionState::PendingPhotoApproval,
            Self::PhotoApproved => SubmissionState::PhotoApproved,
            Self::PhotoRejected => SubmissionState::PhotoRejected,
            Self::GeneratingVideo => SubmissionState::GeneratingVideo,
            Self::PendingGenerationRetry => SubmissionState::PendingGenerationRetry,
            Self::GenerationFailed => SubmissionState::GenerationFailed,
            Self::PendingVideoApproval => SubmissionState::PendingVideoApproval,
            Self::VideoApproved => SubmissionState::VideoApproved,
            Self::VideoRejected => SubmissionState::VideoRejected,
        }
    }

    /// Create from state machine state
    pub fn from_state(state: SubmissionState) -> Self {
        match state {
            SubmissionState::PendingPhotoApproval => Self::PendingPhotoApproval,
            SubmissionState::PhotoApproved => Self::PhotoApproved,
            SubmissionState::PhotoRejected => Self::PhotoRejected,
            SubmissionState::GeneratingVideo => Self::GeneratingVideo,
            SubmissionState::PendingGenerationRetry => Self::PendingGenerationRetry,
            SubmissionState::GenerationFailed => Self::GenerationFailed,
            SubmissionState::PendingVideoApproval => Self::PendingVideoApproval,
            SubmissionState::VideoApproved => Self::VideoApproved,
            SubmissionState::VideoRejected => Self::VideoRejected,
        }
    }

    /// Statuses from which `event` may fire
    pub fn sources_of(event: SubmissionEvent) -> Vec<SubmissionStatus> {
        event.sources().iter().map(|s| Self::from_state(*s)).collect()
    }

    /// Statuses in which the prompt may still be edited
    pub fn pre_generation() -> Vec<SubmissionStatus> {
        SubmissionState::ALL
            .iter()
            .filter(|s| s.is_pre_generation())
            .map(|s| Self::from_state(*s))
            .collect()
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.to_state().fmt(f)
    }
}

/// Submission entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Submission {
    pub id: Uuid,
    pub submission_code: String,
    pub status: SubmissionStatus,
    pub photo_ref: String,
    pub video_ref: Option<String>,
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

impl Submission {
    /// Create a new submission in the initial state
    pub fn new(
        submission_code: String,
        photo_ref: String,
        user_prompt: Option<String>,
        user_name: Option<String>,
        email: Option<String>,
    ) -> Result<Self> {
        if photo_ref.trim().is_empty() {
            return Err(Error::Validation("Photo reference is required".to_string()));
        }

        let email = normalize_optional(email);
        if let Some(address) = &email {
            if !address.validate_email() {
                return Err(Error::Validation(format!(
                    "Invalid email address: {}",
                    address
                )));
            }
        }

        let now = Utc::now();
        Ok(Submission {
            id: Uuid::new_v4(),
            submission_code,
            status: SubmissionStatus::default(),
            photo_ref,
            video_ref: None,
            user_prompt: normalize_prompt(user_prompt)?,
            user_name: normalize_optional(user_name),
            email,
            error_message: None,
            moderation_comment: None,
            photo_moderated_at: None,
            video_moderated_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a transition's auxiliary fields in place (used by stores that
    /// keep records in memory).
    pub fn apply(&mut self, status: SubmissionStatus, fields: &FieldUpdates, now: DateTime<Utc>) {
        self.status = status;
        if let Some(video_ref) = &fields.video_ref {
            self.video_ref = Some(video_ref.clone());
        }
        if let Some(error_message) = &fields.error_message {
            self.error_message = error_message.clone();
        }
        if let Some(comment) = &fields.moderation_comment {
            self.moderation_comment = Some(comment.clone());
        }
        if let Some(at) = fields.photo_moderated_at {
            self.photo_moderated_at = Some(at);
        }
        if let Some(at) = fields.video_moderated_at {
            self.video_moderated_at = Some(at);
        }
        self.updated_at = now;
    }
}

/// Auxiliary fields written together with a status change.
///
/// `None` leaves a column untouched. `error_message: Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldUpdates {
    pub video_ref: Option<String>,
    pub error_message: Option<Option<String>>,
    pub moderation_comment: Option<String>,
    pub photo_moderated_at: Option<DateTime<Utc>>,
    pub video_moderated_at: Option<DateTime<Utc>>,
}

impl FieldUpdates {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_video_ref(mut self, video_ref: impl Into<String>) -> Self {
        self.video_ref = Some(video_ref.into());
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(Some(message.into()));
        self
    }

    pub fn clearing_error(mut self) -> Self {
        self.error_message = Some(None);
        self
    }

    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.moderation_comment = normalize_optional(comment);
        self
    }

    pub fn photo_moderated(mut self, at: DateTime<Utc>) -> Self {
        self.photo_moderated_at = Some(at);
        self
    }

    pub fn video_moderated(mut self, at: DateTime<Utc>) -> Self {
        self.video_moderated_at = Some(at);
        self
    }
}

/// Generate a fresh public submission code
pub fn generate_submission_code() -> String {
    let mut rng = rand::thread_rng();
    (0..SUBMISSION_CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Check that `content_type` is an accepted photo type
pub fn validate_photo_content_type(content_type: &str) -> Result<()> {
    if ALLOWED_PHOTO_TYPES.contains(&content_type) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "Invalid file type '{}'. Allowed types: {}",
            content_type,
            ALLOWED_PHOTO_TYPES.join(", ")
        )))
    }
}

/// Pick the stored file extension: the filename's when it is a known photo
/// extension, else one derived from the content type, else `.jpg`.
pub fn photo_extension(file_name: Option<&str>, content_type: &str) -> String {
    let from_name = file_name
        .and_then(|name| name.rfind('.').map(|i| name[i..].to_ascii_lowercase()))
        .filter(|ext| ALLOWED_PHOTO_EXTENSIONS.contains(&ext.as_str()));

    if let Some(ext) = from_name {
        return ext;
    }

    match content_type {
        "image/png" => ".png",
        "image/gif" => ".gif",
        "image/webp" => ".webp",
        _ => ".jpg",
    }
    .to_string()
}

/// Object storage path for a submission's photo
pub fn photo_path(submission_code: &str, extension: &str) -> String {
    format!("pending_photos/{}{}", submission_code, extension)
}

/// Trim a prompt; blank prompts become `None`
pub fn normalize_prompt(prompt: Option<String>) -> Result<Option<String>> {
    let prompt = normalize_optional(prompt);
    if let Some(p) = &prompt {
        if p.chars().count() > MAX_PROMPT_LENGTH {
            return Err(Error::Validation(format!(
                "Prompt must be at most {} characters",
                MAX_PROMPT_LENGTH
            )));
        }
    }
    Ok(prompt)
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
