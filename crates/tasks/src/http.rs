//! HTTP Push Task Dispatcher
//!
//! Delivers each task as `POST {target}/generation/{id}` from a background
//! tokio task. A non-2xx answer (or a transport error) schedules a
//! redelivery with exponential backoff and an incremented
//! `X-Task-Retry-Count`, until `max_deliveries` is reached.

use std::time::Duration;

use uuid::Uuid;

use crate::{TaskConfig, TaskDispatcher, TaskError, RETRY_COUNT_HEADER};

/// Final state of one task's delivery sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryReport {
    /// The handler acknowledged on delivery number `attempts`
    Acknowledged { attempts: u32 },
    /// Every delivery asked for a retry or failed in transit
    Exhausted { attempts: u32 },
}

#[derive(Clone)]
pub struct HttpTaskDispatcher {
    http: reqwest::Client,
    target_base_url: String,
    api_key: Option<String>,
    max_deliveries: u32,
    initial_backoff: Duration,
}

impl HttpTaskDispatcher {
    pub fn new(config: TaskConfig) -> Result<Self, TaskError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30 * 60))
            .build()
            .map_err(|e| TaskError::Configuration(e.to_string()))?;

        Ok(Self {
            http,
            target_base_url: config.target_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            max_deliveries: config.max_deliveries.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
        })
    }

    fn task_url(&self, submission_id: Uuid) -> String {
        format!("{}/generation/{}", self.target_base_url, submission_id)
    }

    async fn deliver_once(&self, submission_id: Uuid, retry_count: u32) -> Result<(), TaskError> {
        let mut request = self
            .http
            .post(self.task_url(submission_id))
            .header(RETRY_COUNT_HEADER, retry_count.to_string());
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TaskError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TaskError::Response(format!(
                "Task handler returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    /// Run the whole delivery sequence for one task.
    pub async fn deliver(&self, submission_id: Uuid) -> DeliveryReport {
        let mut backoff = self.initial_backoff;

        for retry_count in 0..self.max_deliveries {
            match self.deliver_once(submission_id, retry_count).await {
                Ok(()) => {
                    tracing::debug!(
                        submission_id = %submission_id,
                        retry_count,
                        "Generation task acknowledged"
                    );
                    return DeliveryReport::Acknowledged {
                        attempts: retry_count + 1,
                    };
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        submission_id = %submission_id,
                        retry_count,
                        "Generation task delivery not acknowledged"
                    );
                    if retry_count + 1 < self.max_deliveries {
                        tokio::time::sleep(backoff).await;
                        backoff = backoff.saturating_mul(2);
                    }
                }
            }
        }

        tracing::error!(
            submission_id = %submission_id,
            attempts = self.max_deliveries,
            "Generation task exhausted its deliveries"
        );
        DeliveryReport::Exhausted {
            attempts: self.max_deliveries,
        }
    }
}

#[async_trait::async_trait]
impl TaskDispatcher for HttpTaskDispatcher {
    async fn enqueue(&self, submission_id: Uuid) -> Result<(), TaskError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| TaskError::Configuration(format!("no async runtime: {e}")))?;

        let dispatcher = self.clone();
        runtime.spawn(async move {
            dispatcher.deliver(submission_id).await;
        });

        tracing::info!(submission_id = %submission_id, "Generation task enqueued");
        Ok(())
    }
}
