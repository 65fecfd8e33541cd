//! Submissions domain state and auth backend integration

use std::sync::Arc;
use std::time::Duration;

use axum::extract::FromRef;
use motionbooth_auth::AuthBackend;
use motionbooth_llm::LlmService;
use motionbooth_storage::AssetGateway;
use motionbooth_tasks::TaskDispatcher;
use motionbooth_videogen::GenerationProvider;

use crate::repository::SubmissionStore;
use crate::services::generation::{GenerationPolicy, GenerationTaskHandler};
use crate::services::moderation::ModerationService;
use crate::services::prompts::PromptAssistant;
use crate::services::sweep::StaleGenerationSweeper;

/// Tunables the services are built with
#[derive(Debug, Clone)]
pub struct SubmissionsSettings {
    pub policy: GenerationPolicy,
    pub sweep_threshold: Duration,
    pub signed_url_ttl: Duration,
    pub prompt_theme: String,
}

/// Application state for the Submissions domain
#[derive(Clone)]
pub struct SubmissionsState {
    pub store: Arc<dyn SubmissionStore>,
    pub assets: Arc<dyn AssetGateway>,
    pub generation: GenerationTaskHandler,
    pub moderation: ModerationService,
    pub sweeper: StaleGenerationSweeper,
    pub prompts: PromptAssistant,
    pub auth: AuthBackend,
    pub signed_url_ttl: Duration,
}

impl SubmissionsState {
    /// Wire the services over their adapters
    pub fn new(
        store: Arc<dyn SubmissionStore>,
        assets: Arc<dyn AssetGateway>,
        provider: Arc<dyn GenerationProvider>,
        tasks: Arc<dyn TaskDispatcher>,
        llm: Arc<dyn LlmService>,
        auth: AuthBackend,
        settings: SubmissionsSettings,
    ) -> Self {
        Self {
            generation: GenerationTaskHandler::new(store.clone(), provider, settings.policy),
            moderation: ModerationService::new(store.clone(), tasks.clone()),
            sweeper: StaleGenerationSweeper::new(store.clone(), tasks, settings.sweep_threshold),
            prompts: PromptAssistant::new(llm, settings.prompt_theme),
            store,
            assets,
            auth,
            signed_url_ttl: settings.signed_url_ttl,
        }
    }
}

impl FromRef<SubmissionsState> for AuthBackend {
    fn from_ref(state: &SubmissionsState) -> Self {
        state.auth.clone()
    }
}
