//! Mock LLM Service Implementation
//!
//! Used by `LlmServiceFactory` when provider is `"mock"`.
//! Returns deterministic responses for testing: a fixed set of prompt
//! suggestions when asked for a `"prompts"` JSON object, otherwise an echo.
//! A canned response can be set to override both.

use std::sync::{Arc, RwLock};

use crate::{CompletionRequest, CompletionResponse, LlmError, LlmService};

pub const MOCK_SUGGESTIONS: [&str; 3] = [
    "Slow dolly zoom toward the subject as Kyoto cherry blossoms drift past at golden hour",
    "Camera pans across Santorini rooftops while the sea sparkles and a gentle breeze moves hair",
    "Timelapse of Reykjavik northern lights swirling overhead as the subject looks up in wonder",
];

/// Mock LLM service for testing
#[derive(Debug, Clone, Default)]
pub struct MockLlmService {
    canned: Arc<RwLock<Option<String>>>,
    requests: Arc<RwLock<Vec<CompletionRequest>>>,
}

impl MockLlmService {
    /// Create a new mock LLM service
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every request with `content` (None restores the default)
    pub fn set_response(&self, content: Option<String>) {
        *self.canned.write().unwrap() = content;
    }

    /// Requests received so far
    pub fn recorded_requests(&self) -> Vec<CompletionRequest> {
        self.requests.read().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmService for MockLlmService {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        tracing::info!("Mock LLM service processing completion request");

        let model = if request.model.is_empty() {
            "mock-model".to_string()
        } else {
            request.model.clone()
        };

        let last_message = request
            .messages
            .last()
            .map(|m| m.content.as_str())
            .unwrap_or("empty");

        let canned = self
            .canned
            .read()
            .map_err(|e| LlmError::Request(format!("mock lock poisoned: {e}")))?
            .clone();

        let content = match canned {
            Some(content) => content,
            None if last_message.contains("\"prompts\"") => {
                serde_json::json!({ "prompts": MOCK_SUGGESTIONS }).to_string()
            }
            None => format!("Mock response to: {}", last_message),
        };

        let input_tokens = request
            .messages
            .iter()
            .map(|m| m.content.len() as i32 / 4)
            .sum::<i32>();
        let output_tokens = content.len() as i32 / 4;

        self.requests
            .write()
            .map_err(|e| LlmError::Request(format!("mock lock poisoned: {e}")))?
            .push(request);

        Ok(CompletionResponse {
            content,
            model,
            input_tokens,
            output_tokens,
            stop_reason: "end_turn".to_string(),
        })
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }
}
