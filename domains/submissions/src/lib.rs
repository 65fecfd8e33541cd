//! Submissions domain: photo-to-video submissions moving through moderation
//! and asynchronous generation

pub mod api;
pub mod domain;
pub mod repository;
pub mod services;

// Re-export domain types at the crate root for convenience
pub use domain::entities::*;
pub use domain::state::{StateError, SubmissionEvent, SubmissionState, SubmissionStateMachine};

// Re-export store types
pub use repository::{InMemorySubmissionStore, PgSubmissionStore, SubmissionStore};

// Re-export services
pub use services::generation::{GenerationPolicy, GenerationTaskHandler, TaskOutcome};
pub use services::moderation::{Decision, ModerationService};
pub use services::prompts::PromptAssistant;
pub use services::sweep::{StaleGenerationSweeper, SweepReport};

// Re-export API types
pub use api::routes;
pub use api::{SubmissionsSettings, SubmissionsState};
