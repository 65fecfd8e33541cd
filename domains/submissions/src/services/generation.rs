//! Generation task handler
//!
//! Entry point for every delivery of a generation task. Deliveries are
//! at-least-once, so the handler gates on the record's status with a CAS and
//! keeps all resumable state in the record itself: any number of deliveries
//! for the same submission produce at most one provider job per attempt.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use motionbooth_common::{Config, Result};
use motionbooth_videogen::{GenerationProvider, JobStatus};

use crate::domain::entities::FieldUpdates;
use crate::domain::state::SubmissionEvent;
use crate::repository::SubmissionStore;

/// Failure reason recorded when a job never finished within the polling window
pub const POLLING_TIMEOUT_REASON: &str = "Polling timed out";

/// Polling and retry bounds for one generation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationPolicy {
    pub poll_interval: Duration,
    pub max_polling_attempts: u32,
    /// Redelivery count at which a failure becomes terminal
    pub max_retries: u32,
}

impl GenerationPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll_interval: Duration::from_secs(config.polling_interval_seconds),
            max_polling_attempts: config.max_polling_attempts.max(1),
            max_retries: config.generation_max_retries,
        }
    }

    /// Longest time a single delivery can spend polling, `None` on overflow
    pub fn polling_window(&self) -> Option<Duration> {
        self.poll_interval.checked_mul(self.max_polling_attempts)
    }
}

impl Default for GenerationPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(15),
            max_polling_attempts: 80,
            max_retries: 3,
        }
    }
}

/// What a delivery achieved; decides between ack and redelivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TaskOutcome {
    /// No such submission
    NotFound,
    /// Another delivery already claimed or finished this attempt
    AlreadyHandled,
    /// Video ready for moderation
    Completed { video_ref: String },
    /// Retries exhausted; the submission is now GENERATION_FAILED
    Failed { reason: String },
    /// Attempt failed; the submission waits in PENDING_GENERATION_RETRY
    RetryRequested { reason: String },
    /// The closing transition lost to another writer (e.g. the sweep)
    Superseded,
}

impl TaskOutcome {
    /// Whether the delivery mechanism should try this task again
    pub fn should_redeliver(&self) -> bool {
        matches!(self, TaskOutcome::RetryRequested { .. })
    }
}

/// Result of driving one provider job to an end
#[derive(Debug, Clone, PartialEq, Eq)]
enum JobResult {
    Succeeded(String),
    Failed(String),
}

#[derive(Clone)]
pub struct GenerationTaskHandler {
    store: Arc<dyn SubmissionStore>,
    provider: Arc<dyn GenerationProvider>,
    policy: GenerationPolicy,
}

impl GenerationTaskHandler {
    pub fn new(
        store: Arc<dyn SubmissionStore>,
        provider: Arc<dyn GenerationProvider>,
        policy: GenerationPolicy,
    ) -> Self {
        Self {
            store,
            provider,
            policy,
        }
    }

    pub fn policy(&self) -> &GenerationPolicy {
        &self.policy
    }

    /// Process one delivery of the generation task for `submission_id`.
    ///
    /// `redelivery_count` is 0 on the first delivery. Store errors are
    /// returned as-is so the caller can request redelivery without any end
    /// state having been asserted.
    pub async fn handle(&self, submission_id: Uuid, redelivery_count: u32) -> Result<TaskOutcome> {
        let Some(submission) = self.store.get_by_id(submission_id).await? else {
            tracing::warn!(submission_id = %submission_id, "Generation task for unknown submission");
            return Ok(TaskOutcome::NotFound);
        };

        let claimed = self
            .store
            .transition(
                submission_id,
                SubmissionEvent::StartGeneration,
                FieldUpdates::none().clearing_error(),
            )
            .await?;

        if !claimed {
            tracing::info!(
                submission_id = %submission_id,
                status = %submission.status,
                "Generation already handled, acknowledging"
            );
            return Ok(TaskOutcome::AlreadyHandled);
        }

        // The prompt may have changed between the first read and the claim.
        // GENERATING_VIDEO refuses prompt edits, so this read is final.
        let Some(claimed) = self.store.get_by_id(submission_id).await? else {
            tracing::warn!(submission_id = %submission_id, "Submission vanished after its claim");
            return Ok(TaskOutcome::NotFound);
        };

        tracing::info!(
            submission_id = %submission_id,
            redelivery_count,
            "Starting video generation"
        );

        let result = self
            .run_job(
                submission_id,
                &claimed.photo_ref,
                claimed.user_prompt.as_deref(),
            )
            .await;

        match result {
            JobResult::Succeeded(video_ref) => {
                let applied = self
                    .store
                    .transition(
                        submission_id,
                        SubmissionEvent::GenerationSucceeded,
                        FieldUpdates::none().with_video_ref(&video_ref),
                    )
                    .await?;

                if !applied {
                    tracing::warn!(
                        submission_id = %submission_id,
                        "Submission left GENERATING_VIDEO before the video was recorded"
                    );
                    return Ok(TaskOutcome::Superseded);
                }

                tracing::info!(submission_id = %submission_id, video_ref = %video_ref, "Video generated");
                Ok(TaskOutcome::Completed { video_ref })
            }
            JobResult::Failed(reason) => {
                let exhausted = redelivery_count >= self.policy.max_retries;
                let event = if exhausted {
                    SubmissionEvent::GenerationExhausted
                } else {
                    SubmissionEvent::ScheduleRetry
                };

                let applied = self
                    .store
                    .transition(submission_id, event, FieldUpdates::none().with_error(&reason))
                    .await?;

                if !applied {
                    tracing::warn!(
                        submission_id = %submission_id,
                        error = %reason,
                        "Submission left GENERATING_VIDEO before the failure was recorded"
                    );
                    return Ok(TaskOutcome::Superseded);
                }

                if exhausted {
                    tracing::error!(
                        submission_id = %submission_id,
                        redelivery_count,
                        error = %reason,
                        "Video generation failed permanently"
                    );
                    Ok(TaskOutcome::Failed { reason })
                } else {
                    tracing::warn!(
                        submission_id = %submission_id,
                        redelivery_count,
                        error = %reason,
                        "Video generation failed, requesting redelivery"
                    );
                    Ok(TaskOutcome::RetryRequested { reason })
                }
            }
        }
    }

    /// Submit a job and poll it until it ends or the attempts run out.
    ///
    /// Provider errors count as a failed job. Holds no store handle while
    /// sleeping.
    async fn run_job(&self, submission_id: Uuid, photo_ref: &str, prompt: Option<&str>) -> JobResult {
        let job = match self.provider.submit(photo_ref, prompt).await {
            Ok(job) => job,
            Err(e) => {
                tracing::error!(submission_id = %submission_id, error = %e, "Job submission failed");
                return JobResult::Failed(e.to_string());
            }
        };

        tracing::info!(submission_id = %submission_id, job_id = %job, "Generation job submitted");

        for attempt in 1..=self.policy.max_polling_attempts {
            match self.provider.poll(&job).await {
                Ok(JobStatus::Running) => {
                    tracing::debug!(
                        submission_id = %submission_id,
                        job_id = %job,
                        attempt,
                        "Generation job still running"
                    );
                }
                Ok(JobStatus::Succeeded { asset_ref }) => return JobResult::Succeeded(asset_ref),
                Ok(JobStatus::Failed { reason }) => return JobResult::Failed(reason),
                Err(e) => {
                    tracing::error!(
                        submission_id = %submission_id,
                        job_id = %job,
                        attempt,
                        error = %e,
                        "Polling generation job failed"
                    );
                    return JobResult::Failed(e.to_string());
                }
            }

            if attempt < self.policy.max_polling_attempts {
                tokio::time::sleep(self.policy.poll_interval).await;
            }
        }

        tracing::error!(
            submission_id = %submission_id,
            job_id = %job,
            attempts = self.policy.max_polling_attempts,
            "Generation job polling timed out"
        );
        JobResult::Failed(POLLING_TIMEOUT_REASON.to_string())
    }
}
