//! Inngest Task Dispatcher
//!
//! Publishes a `motionbooth/generation.requested` event to the Inngest
//! event API at `{base_url}/e/{event_key}`. The Inngest function bound to
//! the event calls back into `POST /generation/{id}` and owns redelivery.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{TaskConfig, TaskDispatcher, TaskError, GENERATION_REQUESTED_EVENT};

/// An event to send to Inngest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InngestEvent {
    pub name: String,
    pub data: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,
}

impl InngestEvent {
    pub fn generation_requested(submission_id: Uuid) -> Self {
        Self {
            name: GENERATION_REQUESTED_EVENT.to_string(),
            data: serde_json::json!({ "submission_id": submission_id }),
            id: None,
            ts: Some(chrono::Utc::now().timestamp_millis()),
        }
    }
}

pub struct InngestDispatcher {
    http: reqwest::Client,
    event_url: String,
}

impl InngestDispatcher {
    pub fn new(config: TaskConfig) -> Self {
        let event_url = format!(
            "{}/e/{}",
            config.inngest_base_url.trim_end_matches('/'),
            config.inngest_event_key
        );
        Self {
            http: reqwest::Client::new(),
            event_url,
        }
    }
}

#[async_trait::async_trait]
impl TaskDispatcher for InngestDispatcher {
    async fn enqueue(&self, submission_id: Uuid) -> Result<(), TaskError> {
        let events = vec![InngestEvent::generation_requested(submission_id)];

        let response = self
            .http
            .post(&self.event_url)
            .json(&events)
            .send()
            .await
            .map_err(|e| TaskError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read response body".to_string());
            return Err(TaskError::Response(format!(
                "Inngest API returned {}: {}",
                status, body
            )));
        }

        tracing::debug!(submission_id = %submission_id, "Generation event sent to Inngest");
        Ok(())
    }
}
