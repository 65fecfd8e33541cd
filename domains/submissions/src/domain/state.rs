//! Submission status state machine
//!
//! The single definition of the submission lifecycle:
//! - Valid states
//! - Events naming every edge, each with its source set and target
//! - Terminal states
//!
//! ```text
//! PENDING_PHOTO_APPROVAL -> PHOTO_APPROVED | PHOTO_REJECTED*
//! PHOTO_APPROVED          -> GENERATING_VIDEO
//! GENERATING_VIDEO        -> PENDING_VIDEO_APPROVAL | GENERATION_FAILED* | PENDING_GENERATION_RETRY
//! PENDING_GENERATION_RETRY -> GENERATING_VIDEO
//! PENDING_VIDEO_APPROVAL  -> VIDEO_APPROVED* | VIDEO_REJECTED*
//! ```
//! (`*` terminal)

pub use motionbooth_common::StateError;

// ============================================================================
// Submission State Machine
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmissionState {
    PendingPhotoApproval,
    PhotoApproved,
    PhotoRejected,
    GeneratingVideo,
    PendingGenerationRetry,
    GenerationFailed,
    PendingVideoApproval,
    VideoApproved,
    VideoRejected,
}

impl SubmissionState {
    pub const ALL: [SubmissionState; 9] = [
        Self::PendingPhotoApproval,
        Self::PhotoApproved,
        Self::PhotoRejected,
        Self::GeneratingVideo,
        Self::PendingGenerationRetry,
        Self::GenerationFailed,
        Self::PendingVideoApproval,
        Self::VideoApproved,
        Self::VideoRejected,
    ];

    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }

    /// States in which the prompt may still be edited
    pub fn is_pre_generation(&self) -> bool {
        matches!(
            self,
            Self::PendingPhotoApproval | Self::PhotoApproved | Self::PendingGenerationRetry
        )
    }

    /// Get all valid next states from current state
    pub fn valid_transitions(&self) -> &'static [SubmissionState] {
        match self {
            Self::PendingPhotoApproval => &[Self::PhotoApproved, Self::PhotoRejected],
            Self::PhotoApproved => &[Self::GeneratingVideo],
            Self::GeneratingVideo => &[
                Self::PendingVideoApproval,
                Self::GenerationFailed,
                Self::PendingGenerationRetry,
            ],
            Self::PendingGenerationRetry => &[Self::GeneratingVideo],
            Self::PendingVideoApproval => &[Self::VideoApproved, Self::VideoRejected],
            Self::PhotoRejected
            | Self::GenerationFailed
            | Self::VideoApproved
            | Self::VideoRejected => &[],
        }
    }

    /// Whether `self -> next` is an edge of the lifecycle graph
    pub fn can_move_to(&self, next: SubmissionState) -> bool {
        self.valid_transitions().contains(&next)
    }
}

impl std::fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PendingPhotoApproval => write!(f, "PENDING_PHOTO_APPROVAL"),
            Self::PhotoApproved => write!(f, "PHOTO_APPROVED"),
            Self::PhotoRejected => write!(f, "PHOTO_REJECTED"),
            Self::GeneratingVideo => write!(f, "GENERATING_VIDEO"),
            Self::PendingGenerationRetry => write!(f, "PENDING_GENERATION_RETRY"),
            Self::GenerationFailed => write!(f, "GENERATION_FAILED"),
            Self::PendingVideoApproval => write!(f, "PENDING_VIDEO_APPROVAL"),
            Self::VideoApproved => write!(f, "VIDEO_APPROVED"),
            Self::VideoRejected => write!(f, "VIDEO_REJECTED"),
        }
    }
}

/// Events that trigger submission state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionEvent {
    /// Moderator accepts the photo
    ApprovePhoto,
    /// Moderator refuses the photo
    RejectPhoto,
    /// Task handler claims the submission for a generation attempt
    StartGeneration,
    /// Provider produced a video
    GenerationSucceeded,
    /// Attempt failed with deliveries remaining (also used by the stale sweep)
    ScheduleRetry,
    /// Attempt failed and no deliveries remain
    GenerationExhausted,
    /// Moderator accepts the video
    ApproveVideo,
    /// Moderator refuses the video
    RejectVideo,
}

impl SubmissionEvent {
    /// States from which this event may fire
    pub fn sources(&self) -> &'static [SubmissionState] {
        use SubmissionState::*;
        match self {
            Self::ApprovePhoto | Self::RejectPhoto => &[PendingPhotoApproval],
            Self::StartGeneration => &[PhotoApproved, PendingGenerationRetry],
            Self::GenerationSucceeded | Self::ScheduleRetry | Self::GenerationExhausted => {
                &[GeneratingVideo]
            }
            Self::ApproveVideo | Self::RejectVideo => &[PendingVideoApproval],
        }
    }

    /// State this event moves to
    pub fn target(&self) -> SubmissionState {
        match self {
            Self::ApprovePhoto => SubmissionState::PhotoApproved,
            Self::RejectPhoto => SubmissionState::PhotoRejected,
            Self::StartGeneration => SubmissionState::GeneratingVideo,
            Self::GenerationSucceeded => SubmissionState::PendingVideoApproval,
            Self::ScheduleRetry => SubmissionState::PendingGenerationRetry,
            Self::GenerationExhausted => SubmissionState::GenerationFailed,
            Self::ApproveVideo => SubmissionState::VideoApproved,
            Self::RejectVideo => SubmissionState::VideoRejected,
        }
    }
}

impl std::fmt::Display for SubmissionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApprovePhoto => write!(f, "approve_photo"),
            Self::RejectPhoto => write!(f, "reject_photo"),
            Self::StartGeneration => write!(f, "start_generation"),
            Self::GenerationSucceeded => write!(f, "generation_succeeded"),
            Self::ScheduleRetry => write!(f, "schedule_retry"),
            Self::GenerationExhausted => write!(f, "generation_exhausted"),
            Self::ApproveVideo => write!(f, "approve_video"),
            Self::RejectVideo => write!(f, "reject_video"),
        }
    }
}

/// Submission state machine
pub struct SubmissionStateMachine;

impl SubmissionStateMachine {
    /// Attempt a state transition
    ///
    /// Returns the new state if the transition is valid, or an error otherwise.
    pub fn transition(
        current: SubmissionState,
        event: SubmissionEvent,
    ) -> Result<SubmissionState, StateError> {
        if current.is_terminal() {
            return Err(StateError::TerminalState(current.to_string()));
        }

        if !event.sources().contains(&current) {
            return Err(StateError::InvalidTransition {
                from: current.to_string(),
                event: event.to_string(),
            });
        }

        Ok(event.target())
    }

    /// Check if a transition is valid without performing it
    pub fn can_transition(current: SubmissionState, event: &SubmissionEvent) -> bool {
        Self::transition(current, *event).is_ok()
    }

    /// Refuse a compare-and-set whose (expected, new) pairs leave the graph.
    ///
    /// Every expected state must have an edge to `next`; an empty expected
    /// set is refused too.
    pub fn ensure_edges(
        expected: &[SubmissionState],
        next: SubmissionState,
    ) -> Result<(), StateError> {
        if expected.is_empty() {
            return Err(StateError::IllegalEdge {
                from: "<none>".to_string(),
                to: next.to_string(),
            });
        }

        match expected.iter().find(|from| !from.can_move_to(next)) {
            Some(from) => Err(StateError::IllegalEdge {
                from: from.to_string(),
                to: next.to_string(),
            }),
            None => Ok(()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
