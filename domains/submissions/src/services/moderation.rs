//! Moderation decisions on photos and generated videos

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use motionbooth_common::{Error, Result};
use motionbooth_tasks::TaskDispatcher;

use crate::domain::entities::{FieldUpdates, SubmissionStatus};
use crate::domain::state::SubmissionEvent;
use crate::repository::SubmissionStore;

/// A moderator's verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

#[derive(Clone)]
pub struct ModerationService {
    store: Arc<dyn SubmissionStore>,
    tasks: Arc<dyn TaskDispatcher>,
}

impl ModerationService {
    pub fn new(store: Arc<dyn SubmissionStore>, tasks: Arc<dyn TaskDispatcher>) -> Self {
        Self { store, tasks }
    }

    /// Decide on an uploaded photo. Approval queues one generation task.
    ///
    /// An approval whose enqueue fails stays approved and reports
    /// `ServiceUnavailable`; `retry_generation` recovers it.
    pub async fn decide_photo(
        &self,
        submission_id: Uuid,
        decision: Decision,
        comment: Option<String>,
    ) -> Result<()> {
        let now = Utc::now();
        let (event, fields) = match decision {
            Decision::Approve => (
                SubmissionEvent::ApprovePhoto,
                FieldUpdates::none().photo_moderated(now),
            ),
            Decision::Reject => (
                SubmissionEvent::RejectPhoto,
                FieldUpdates::none().with_comment(comment).photo_moderated(now),
            ),
        };

        self.apply(submission_id, event, fields).await?;
        tracing::info!(submission_id = %submission_id, event = %event, "Photo moderated");

        if decision == Decision::Approve {
            self.tasks.enqueue(submission_id).await.map_err(|e| {
                tracing::error!(
                    submission_id = %submission_id,
                    error = %e,
                    "Photo approved but the generation task could not be queued"
                );
                Error::ServiceUnavailable(format!(
                    "Photo approved but generation could not be queued: {e}"
                ))
            })?;
        }

        Ok(())
    }

    /// Decide on a generated video
    pub async fn decide_video(
        &self,
        submission_id: Uuid,
        decision: Decision,
        comment: Option<String>,
    ) -> Result<()> {
        let now = Utc::now();
        let (event, fields) = match decision {
            Decision::Approve => (
                SubmissionEvent::ApproveVideo,
                FieldUpdates::none().video_moderated(now),
            ),
            Decision::Reject => (
                SubmissionEvent::RejectVideo,
                FieldUpdates::none().with_comment(comment).video_moderated(now),
            ),
        };

        self.apply(submission_id, event, fields).await?;
        tracing::info!(submission_id = %submission_id, event = %event, "Video moderated");
        Ok(())
    }

    /// Queue another generation task for a submission waiting on one.
    ///
    /// Changes no status; the task handler's own gate decides.
    pub async fn retry_generation(&self, submission_id: Uuid) -> Result<()> {
        let submission = self
            .store
            .get_by_id(submission_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Submission {} not found", submission_id)))?;

        let startable = SubmissionStatus::sources_of(SubmissionEvent::StartGeneration);
        if !startable.contains(&submission.status) {
            return Err(Error::Conflict(format!(
                "Submission {} is {}; generation can only be queued from {}",
                submission_id,
                submission.status,
                startable
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" or ")
            )));
        }

        self.tasks.enqueue(submission_id).await.map_err(|e| {
            tracing::error!(submission_id = %submission_id, error = %e, "Retry enqueue failed");
            Error::ServiceUnavailable(format!("Generation could not be queued: {e}"))
        })?;

        tracing::info!(submission_id = %submission_id, status = %submission.status, "Generation re-queued");
        Ok(())
    }

    /// Fire `event`, turning a lost CAS into NotFound or Conflict
    async fn apply(&self, submission_id: Uuid, event: SubmissionEvent, fields: FieldUpdates) -> Result<()> {
        if self.store.transition(submission_id, event, fields).await? {
            return Ok(());
        }

        match self.store.get_by_id(submission_id).await? {
            None => Err(Error::NotFound(format!(
                "Submission {} not found",
                submission_id
            ))),
            Some(current) => Err(Error::Conflict(format!(
                "Cannot {} submission {}: current status is {}",
                event, submission_id, current.status
            ))),
        }
    }
}
