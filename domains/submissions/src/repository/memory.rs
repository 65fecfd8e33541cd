//! In-memory submission store
//!
//! Backs tests and `STORE_PROVIDER=memory` runs. A single tokio mutex
//! serializes every operation, which makes `compare_and_set` atomic.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use motionbooth_common::{RepositoryError, Result};

use super::{ensure_edges, SubmissionStore};
use crate::domain::entities::{FieldUpdates, Submission, SubmissionStatus};

#[derive(Clone, Default)]
pub struct InMemorySubmissionStore {
    records: Arc<Mutex<HashMap<Uuid, Submission>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemorySubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the store going away; every call fails until restored
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("in-memory store offline".to_string()).into());
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl SubmissionStore for InMemorySubmissionStore {
    async fn create(&self, submission: &Submission) -> Result<Submission> {
        self.check_available()?;
        let mut records = self.records.lock().await;

        if records.contains_key(&submission.id) {
            return Err(RepositoryError::AlreadyExists("Submission id".to_string()).into());
        }
        if records
            .values()
            .any(|r| r.submission_code == submission.submission_code)
        {
            return Err(RepositoryError::AlreadyExists("Submission code".to_string()).into());
        }

        records.insert(submission.id, submission.clone());
        Ok(submission.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Submission>> {
        self.check_available()?;
        Ok(self.records.lock().await.get(&id).cloned())
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Submission>> {
        self.check_available()?;
        Ok(self
            .records
            .lock()
            .await
            .values()
            .find(|r| r.submission_code == code)
            .cloned())
    }

    async fn list_by_status(
        &self,
        status: SubmissionStatus,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Submission>> {
        self.check_available()?;
        let records = self.records.lock().await;
        let mut matching: Vec<Submission> =
            records.values().filter(|r| r.status == status).cloned().collect();
        matching.sort_by_key(|r| (r.created_at, r.id));

        Ok(matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_by_status(&self, status: SubmissionStatus) -> Result<i64> {
        self.check_available()?;
        let records = self.records.lock().await;
        Ok(records.values().filter(|r| r.status == status).count() as i64)
    }

    async fn compare_and_set(
        &self,
        id: Uuid,
        expected: &[SubmissionStatus],
        new_status: SubmissionStatus,
        fields: FieldUpdates,
    ) -> Result<bool> {
        ensure_edges(expected, new_status)?;
        self.check_available()?;

        let mut records = self.records.lock().await;
        match records.get_mut(&id) {
            Some(record) if expected.contains(&record.status) => {
                record.apply(new_status, &fields, Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_prompt(&self, id: Uuid, prompt: Option<String>) -> Result<bool> {
        self.check_available()?;
        let mut records = self.records.lock().await;
        match records.get_mut(&id) {
            Some(record) if record.status.is_pre_generation() => {
                record.user_prompt = prompt;
                record.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_stale(
        &self,
        status: SubmissionStatus,
        older_than: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Submission>> {
        self.check_available()?;
        let records = self.records.lock().await;
        let mut stale: Vec<Submission> = records
            .values()
            .filter(|r| r.status == status && r.updated_at < older_than)
            .cloned()
            .collect();
        stale.sort_by_key(|r| r.updated_at);
        stale.truncate(limit.max(0) as usize);
        Ok(stale)
    }
}
