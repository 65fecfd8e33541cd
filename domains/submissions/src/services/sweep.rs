//! Stale generation sweep
//!
//! A delivery that dies mid-poll leaves its submission in GENERATING_VIDEO
//! with nobody left to close it. Once such a record has been idle for longer
//! than any live delivery could poll, the sweep moves it back to
//! PENDING_GENERATION_RETRY and queues a fresh task.
//!
//! Records waiting in PHOTO_APPROVED or PENDING_GENERATION_RETRY past the
//! same threshold lost their task before it ran (a failed enqueue, or an
//! in-process redelivery that died with its host). Those are re-queued
//! as they are; the handler's claim keeps duplicates harmless.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use motionbooth_common::{Error, Result};
use motionbooth_tasks::TaskDispatcher;

use crate::domain::entities::{FieldUpdates, SubmissionStatus};
use crate::domain::state::SubmissionEvent;
use crate::repository::SubmissionStore;
use crate::services::generation::GenerationPolicy;

/// Error message recorded on swept submissions
pub const STALLED_REASON: &str = "Generation stalled past the polling window";

const DEFAULT_BATCH_LIMIT: i64 = 100;

/// What one sweep pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// GENERATING_VIDEO records moved back to PENDING_GENERATION_RETRY
    pub stalled: usize,
    /// Waiting records whose task was queued again
    pub requeued: usize,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.stalled + self.requeued
    }
}

#[derive(Clone)]
pub struct StaleGenerationSweeper {
    store: Arc<dyn SubmissionStore>,
    tasks: Arc<dyn TaskDispatcher>,
    threshold: Duration,
    batch_limit: i64,
}

impl StaleGenerationSweeper {
    pub fn new(
        store: Arc<dyn SubmissionStore>,
        tasks: Arc<dyn TaskDispatcher>,
        threshold: Duration,
    ) -> Self {
        Self {
            store,
            tasks,
            threshold,
            batch_limit: DEFAULT_BATCH_LIMIT,
        }
    }

    /// Idle time after which a record counts as stalled.
    ///
    /// Fails when the polling window times `safety_factor` does not fit a
    /// duration, or reaches back past the earliest representable timestamp.
    pub fn threshold_for(policy: &GenerationPolicy, safety_factor: u32) -> Result<Duration> {
        let threshold = policy
            .polling_window()
            .and_then(|window| window.checked_mul(safety_factor.max(1)))
            .ok_or_else(|| {
                Error::Validation(format!(
                    "Sweep threshold overflows: {:?} x {} polls x {}",
                    policy.poll_interval, policy.max_polling_attempts, safety_factor
                ))
            })?;

        cutoff_before(Utc::now(), threshold)?;
        Ok(threshold)
    }

    pub fn with_batch_limit(mut self, batch_limit: i64) -> Self {
        self.batch_limit = batch_limit.max(1);
        self
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Run one pass over every status a lost task can strand.
    ///
    /// Waiting records are re-queued before stalled ones are moved, so a
    /// record moved in this pass is not queued twice. A record that moves
    /// but cannot be re-queued stays in PENDING_GENERATION_RETRY and is
    /// picked up again by a later pass.
    pub async fn sweep(&self) -> Result<SweepReport> {
        let cutoff = cutoff_before(Utc::now(), self.threshold)?;
        let mut report = SweepReport::default();

        for status in SubmissionStatus::sources_of(SubmissionEvent::StartGeneration) {
            let waiting = self
                .store
                .list_stale(status, cutoff, self.batch_limit)
                .await?;

            for submission in waiting {
                tracing::warn!(
                    submission_id = %submission.id,
                    status = %status,
                    idle_since = %submission.updated_at,
                    "Re-queueing submission whose generation task never ran"
                );
                if self.requeue(submission.id).await {
                    report.requeued += 1;
                }
            }
        }

        let stalled = self
            .store
            .list_stale(SubmissionStatus::GeneratingVideo, cutoff, self.batch_limit)
            .await?;

        for submission in stalled {
            let moved = self
                .store
                .transition(
                    submission.id,
                    SubmissionEvent::ScheduleRetry,
                    FieldUpdates::none().with_error(STALLED_REASON),
                )
                .await?;

            if !moved {
                continue;
            }
            report.stalled += 1;

            tracing::warn!(
                submission_id = %submission.id,
                idle_since = %submission.updated_at,
                "Swept stalled generation"
            );

            self.requeue(submission.id).await;
        }

        Ok(report)
    }

    async fn requeue(&self, submission_id: Uuid) -> bool {
        match self.tasks.enqueue(submission_id).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    submission_id = %submission_id,
                    error = %e,
                    "Swept submission could not be re-queued"
                );
                false
            }
        }
    }

    /// Sweep every `interval` until the task is dropped
    pub async fn run_periodic(self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            match self.sweep().await {
                Ok(report) if report.total() == 0 => {
                    tracing::debug!("Sweep found no stalled generations")
                }
                Ok(report) => tracing::info!(
                    stalled = report.stalled,
                    requeued = report.requeued,
                    "Sweep recovered stalled generations"
                ),
                Err(e) => tracing::error!(error = %e, "Sweep failed"),
            }
        }
    }
}

/// `now - threshold`, or an error when that is not a representable instant
fn cutoff_before(now: DateTime<Utc>, threshold: Duration) -> Result<DateTime<Utc>> {
    chrono::Duration::from_std(threshold)
        .ok()
        .and_then(|threshold| now.checked_sub_signed(threshold))
        .ok_or_else(|| {
            Error::Validation(format!("Sweep threshold out of range: {threshold:?}"))
        })
}
