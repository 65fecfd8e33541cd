//! Mock Task Dispatcher Implementation
//!
//! Records enqueued submission ids for test assertions.
//! Thread-safe via `Arc<Mutex<>>`.

use std::sync::{Arc, Mutex, RwLock};

use uuid::Uuid;

use crate::{TaskDispatcher, TaskError};

/// Mock dispatcher that records ids instead of delivering them.
#[derive(Debug, Clone, Default)]
pub struct MockTaskDispatcher {
    enqueued: Arc<Mutex<Vec<Uuid>>>,
    fail: Arc<RwLock<bool>>,
}

impl MockTaskDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent enqueues fail (simulates an unreachable queue)
    pub fn set_fail(&self, fail: bool) {
        *self.fail.write().unwrap() = fail;
    }

    /// Return all enqueued ids in order.
    pub fn recorded_enqueues(&self) -> Vec<Uuid> {
        self.enqueued.lock().unwrap().clone()
    }

    /// Clear recorded ids and restore default behavior.
    pub fn reset(&self) {
        self.enqueued.lock().unwrap().clear();
        *self.fail.write().unwrap() = false;
    }
}

#[async_trait::async_trait]
impl TaskDispatcher for MockTaskDispatcher {
    async fn enqueue(&self, submission_id: Uuid) -> Result<(), TaskError> {
        let fail = *self
            .fail
            .read()
            .map_err(|e| TaskError::Request(format!("behavior lock poisoned: {e}")))?;
        if fail {
            return Err(TaskError::Request("mock queue unavailable".to_string()));
        }

        tracing::debug!(submission_id = %submission_id, "Mock tasks: recording enqueue");
        self.enqueued
            .lock()
            .map_err(|e| TaskError::Request(format!("enqueue lock poisoned: {e}")))?
            .push(submission_id);
        Ok(())
    }
}
