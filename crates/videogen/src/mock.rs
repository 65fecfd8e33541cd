//! Mock Generation Provider Implementation
//!
//! Programmable mock for testing generation workflows:
//! - `MockGenerationProvider`: records submissions and polls
//! - `MockProviderBehavior`: controls outcome and how many polls a job takes
//! - `MockOutcome`: Succeed, Fail, Stall, PollError or SubmitError

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::{GenerationProvider, JobHandle, JobStatus, ProviderError};

pub const DEFAULT_MOCK_ASSET_REF: &str = "gs://motionbooth-mock/generated_videos/sample_video.mp4";

/// What outcome the mock should produce
#[derive(Debug, Clone, Default, PartialEq)]
pub enum MockOutcome {
    /// Job succeeds once its polls are used up
    #[default]
    Succeed,
    /// Job reports FAILED once its polls are used up
    Fail,
    /// Job never leaves RUNNING (simulates a polling timeout)
    Stall,
    /// Every poll errors
    PollError,
    /// Submission itself errors
    SubmitError,
}

/// Programmable behavior for the mock provider
#[derive(Debug, Clone)]
pub struct MockProviderBehavior {
    pub outcome: Arc<RwLock<MockOutcome>>,
    /// Number of polls until the job reaches its outcome (1 = first poll)
    pub polls_until_done: Arc<RwLock<u32>>,
    pub asset_ref: Arc<RwLock<String>>,
    pub failure_reason: Arc<RwLock<String>>,
}

impl Default for MockProviderBehavior {
    fn default() -> Self {
        Self {
            outcome: Arc::new(RwLock::new(MockOutcome::Succeed)),
            polls_until_done: Arc::new(RwLock::new(1)),
            asset_ref: Arc::new(RwLock::new(DEFAULT_MOCK_ASSET_REF.to_string())),
            failure_reason: Arc::new(RwLock::new("Mock generation failure".to_string())),
        }
    }
}

impl MockProviderBehavior {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_outcome(&self, outcome: MockOutcome) {
        *self.outcome.write().unwrap() = outcome;
    }

    pub fn set_polls_until_done(&self, polls: u32) {
        *self.polls_until_done.write().unwrap() = polls.max(1);
    }

    pub fn set_asset_ref(&self, asset_ref: impl Into<String>) {
        *self.asset_ref.write().unwrap() = asset_ref.into();
    }

    pub fn set_failure_reason(&self, reason: impl Into<String>) {
        *self.failure_reason.write().unwrap() = reason.into();
    }

    /// Reset to default behavior
    pub fn reset(&self) {
        *self.outcome.write().unwrap() = MockOutcome::Succeed;
        *self.polls_until_done.write().unwrap() = 1;
        *self.asset_ref.write().unwrap() = DEFAULT_MOCK_ASSET_REF.to_string();
        *self.failure_reason.write().unwrap() = "Mock generation failure".to_string();
    }

    pub fn get_outcome(&self) -> MockOutcome {
        self.outcome.read().unwrap().clone()
    }

    pub fn get_polls_until_done(&self) -> u32 {
        *self.polls_until_done.read().unwrap()
    }
}

/// A recorded submit call for test assertions
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSubmission {
    pub photo_ref: String,
    pub prompt: Option<String>,
}

/// Mock provider with programmable behavior
#[derive(Debug, Clone)]
pub struct MockGenerationProvider {
    behavior: Arc<MockProviderBehavior>,
    submissions: Arc<Mutex<Vec<RecordedSubmission>>>,
    polls: Arc<Mutex<HashMap<JobHandle, u32>>>,
}

impl Default for MockGenerationProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGenerationProvider {
    pub fn new() -> Self {
        Self::with_behavior(Arc::new(MockProviderBehavior::new()))
    }

    pub fn with_behavior(behavior: Arc<MockProviderBehavior>) -> Self {
        Self {
            behavior,
            submissions: Arc::new(Mutex::new(Vec::new())),
            polls: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Shared behavior for external configuration
    pub fn behavior(&self) -> &Arc<MockProviderBehavior> {
        &self.behavior
    }

    /// Get recorded submit calls
    pub fn recorded_submissions(&self) -> Vec<RecordedSubmission> {
        self.submissions.lock().unwrap().clone()
    }

    /// Total number of polls across all jobs
    pub fn poll_count(&self) -> u32 {
        self.polls.lock().unwrap().values().sum()
    }

    /// Clear history and restore default behavior
    pub fn reset(&self) {
        self.submissions.lock().unwrap().clear();
        self.polls.lock().unwrap().clear();
        self.behavior.reset();
    }

    fn read<T: Clone>(lock: &RwLock<T>) -> Result<T, ProviderError> {
        lock.read()
            .map(|v| v.clone())
            .map_err(|e| ProviderError::Request(format!("behavior lock poisoned: {e}")))
    }
}

#[async_trait::async_trait]
impl GenerationProvider for MockGenerationProvider {
    async fn submit(
        &self,
        photo_ref: &str,
        prompt: Option<&str>,
    ) -> Result<JobHandle, ProviderError> {
        let mut submissions = self
            .submissions
            .lock()
            .map_err(|e| ProviderError::Request(format!("history lock poisoned: {e}")))?;
        submissions.push(RecordedSubmission {
            photo_ref: photo_ref.to_string(),
            prompt: prompt.map(str::to_string),
        });

        if Self::read(&self.behavior.outcome)? == MockOutcome::SubmitError {
            return Err(ProviderError::Request(
                "Mock provider rejected the submission".to_string(),
            ));
        }

        let handle = JobHandle(format!("mock-job-{}", submissions.len()));
        tracing::info!(job_id = %handle, "Mock provider: job submitted");
        Ok(handle)
    }

    async fn poll(&self, job: &JobHandle) -> Result<JobStatus, ProviderError> {
        let attempt = {
            let mut polls = self
                .polls
                .lock()
                .map_err(|e| ProviderError::Request(format!("poll lock poisoned: {e}")))?;
            let count = polls.entry(job.clone()).or_insert(0);
            *count += 1;
            *count
        };

        let outcome = Self::read(&self.behavior.outcome)?;
        if outcome == MockOutcome::PollError {
            return Err(ProviderError::Request(
                "Mock provider unreachable".to_string(),
            ));
        }
        if outcome == MockOutcome::Stall || attempt < Self::read(&self.behavior.polls_until_done)? {
            return Ok(JobStatus::Running);
        }

        match outcome {
            MockOutcome::Fail => Ok(JobStatus::Failed {
                reason: Self::read(&self.behavior.failure_reason)?,
            }),
            _ => Ok(JobStatus::Succeeded {
                asset_ref: Self::read(&self.behavior.asset_ref)?,
            }),
        }
    }
}
