//! Submission store: the durable record of submissions
//!
//! All status mutation goes through `compare_and_set`, which each
//! implementation performs with its native atomic conditional update.

pub mod memory;
pub mod postgres;

use chrono::{DateTime, Utc};
use motionbooth_common::Result;
use uuid::Uuid;

use crate::domain::entities::{FieldUpdates, Submission, SubmissionStatus};
use crate::domain::state::{SubmissionEvent, SubmissionStateMachine};

pub use memory::InMemorySubmissionStore;
pub use postgres::PgSubmissionStore;

#[async_trait::async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Persist a freshly created submission
    async fn create(&self, submission: &Submission) -> Result<Submission>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Submission>>;

    async fn get_by_code(&self, code: &str) -> Result<Option<Submission>>;

    /// Submissions in `status`, oldest first
    async fn list_by_status(
        &self,
        status: SubmissionStatus,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Submission>>;

    async fn count_by_status(&self, status: SubmissionStatus) -> Result<i64>;

    /// Atomically move `id` to `new_status` if its current status is in
    /// `expected`, writing `fields` and bumping `updated_at`.
    ///
    /// Returns false when the record is missing or its status is not in
    /// `expected`. Pairs outside the lifecycle graph are refused with an
    /// internal error before the store is touched.
    async fn compare_and_set(
        &self,
        id: Uuid,
        expected: &[SubmissionStatus],
        new_status: SubmissionStatus,
        fields: FieldUpdates,
    ) -> Result<bool>;

    /// Replace the prompt while the submission is still pre-generation
    async fn update_prompt(&self, id: Uuid, prompt: Option<String>) -> Result<bool>;

    /// Submissions in `status` not updated since `older_than`, stalest first
    async fn list_stale(
        &self,
        status: SubmissionStatus,
        older_than: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Submission>>;

    /// Fire `event` against `id` through `compare_and_set`
    async fn transition(&self, id: Uuid, event: SubmissionEvent, fields: FieldUpdates) -> Result<bool> {
        let expected = SubmissionStatus::sources_of(event);
        let target = SubmissionStatus::from_state(event.target());
        self.compare_and_set(id, &expected, target, fields).await
    }
}

/// Refuse (expected, new) pairs that are not edges of the lifecycle graph
pub(crate) fn ensure_edges(expected: &[SubmissionStatus], new_status: SubmissionStatus) -> Result<()> {
    let states: Vec<_> = expected.iter().map(SubmissionStatus::to_state).collect();
    SubmissionStateMachine::ensure_edges(&states, new_status.to_state())?;
    Ok(())
}
