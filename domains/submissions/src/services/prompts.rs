//! Prompt assistance backed by the LLM service
//!
//! Both operations are pure: they read the photo bytes and never touch the
//! submission store.

use std::sync::Arc;

use serde::Deserialize;

use motionbooth_common::{Error, Result};
use motionbooth_llm::{CompletionRequest, LlmError, LlmImage, LlmMessage, LlmService};

use crate::domain::entities::validate_photo_content_type;

pub const DEFAULT_PROMPT_THEME: &str = "Travel";

const SUGGESTION_COUNT: usize = 3;

const DRAFT_SYSTEM_PROMPT: &str = "You write prompts for an image-to-video model. \
A good prompt describes camera movement, subject motion, and atmosphere in plain \
present-tense language. Reply with the prompt text only.";

#[derive(Debug, Deserialize)]
struct SuggestionsAnswer {
    prompts: Vec<String>,
}

#[derive(Clone)]
pub struct PromptAssistant {
    llm: Arc<dyn LlmService>,
    theme: String,
}

impl PromptAssistant {
    pub fn new(llm: Arc<dyn LlmService>, theme: impl Into<String>) -> Self {
        Self {
            llm,
            theme: theme.into(),
        }
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    /// Ask for creative generation prompts based on a photo
    pub async fn suggest(&self, photo: &[u8], content_type: &str) -> Result<Vec<String>> {
        validate_photo_content_type(content_type)?;

        let instruction = format!(
            "Suggest {count} creative video generation prompts based on this image, under 30 words each. \
The theme is {theme}, and each prompt must include a specific {theme_lower} destination. \
Be imaginative, descriptive, and fun. \
Answer with JSON only, in the form {{\"prompts\": [\"...\"]}}.",
            count = SUGGESTION_COUNT,
            theme = self.theme,
            theme_lower = self.theme.to_lowercase(),
        );

        let answer = self.complete(None, instruction, photo, content_type).await?;
        let prompts = parse_suggestions(&answer)?;

        tracing::info!(count = prompts.len(), "Generated prompt suggestions");
        Ok(prompts)
    }

    /// Rewrite a user's idea into a generation prompt for the photo
    pub async fn draft(&self, photo: &[u8], content_type: &str, text: &str) -> Result<String> {
        validate_photo_content_type(content_type)?;

        let idea = text.trim();
        if idea.is_empty() {
            return Err(Error::Validation("Prompt text is required".to_string()));
        }

        let instruction = format!(
            "Rewrite this idea into one vivid video generation prompt for the image, under 60 words.\n\nIdea: {idea}"
        );

        let answer = self
            .complete(Some(DRAFT_SYSTEM_PROMPT.to_string()), instruction, photo, content_type)
            .await?;

        let prompt = answer.trim().trim_matches('"').trim().to_string();
        if prompt.is_empty() {
            return Err(Error::Provider("LLM returned an empty prompt".to_string()));
        }
        Ok(prompt)
    }

    async fn complete(
        &self,
        system_prompt: Option<String>,
        instruction: String,
        photo: &[u8],
        content_type: &str,
    ) -> Result<String> {
        let request = CompletionRequest {
            model: self.llm.default_model().to_string(),
            system_prompt,
            messages: vec![
                LlmMessage::user(instruction).with_image(LlmImage::from_bytes(photo, content_type))
            ],
            max_tokens: None,
        };

        let response = self.llm.complete(request).await.map_err(|e| {
            tracing::error!(error = %e, "Prompt assistance request failed");
            match e {
                LlmError::RateLimit => Error::ServiceUnavailable(e.to_string()),
                _ => Error::Provider(e.to_string()),
            }
        })?;

        Ok(response.content)
    }
}

/// Pull the `{"prompts": [...]}` object out of a model answer, tolerating
/// code fences or chatter around it.
fn parse_suggestions(answer: &str) -> Result<Vec<String>> {
    let start = answer.find('{');
    let end = answer.rfind('}');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &answer[start..=end],
        _ => {
            return Err(Error::Provider(
                "LLM answer did not contain a JSON object".to_string(),
            ))
        }
    };

    let parsed: SuggestionsAnswer = serde_json::from_str(json)
        .map_err(|e| Error::Provider(format!("LLM answer was not valid suggestions JSON: {e}")))?;

    let prompts: Vec<String> = parsed
        .prompts
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();

    if prompts.is_empty() {
        return Err(Error::Provider("LLM returned no prompts".to_string()));
    }
    Ok(prompts)
}
