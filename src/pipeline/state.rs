/*!
 * Pipeline states and the status snapshot reported to callers.
 */

use serde::Serialize;
use std::fmt;

/// Where the pipeline is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum PipelineState {
    #[default]
    Idle,
    LoadingMedia,
    ExtractingAudio,
    Transcribing,
    Translating,
    Composing,
    AwaitingReview,
    EmbeddingVideo,
    Completed,
    Failed,
}

impl PipelineState {
    /// Default step label shown while in this state
    pub fn label(self) -> &'static str {
        match self {
            PipelineState::Idle => "",
            PipelineState::LoadingMedia => "Loading media",
            PipelineState::ExtractingAudio => "Extracting audio",
            PipelineState::Transcribing => "Transcribing audio",
            PipelineState::Translating => "Translating subtitles",
            PipelineState::Composing => "Composing subtitles",
            PipelineState::AwaitingReview => "Subtitles ready for review",
            PipelineState::EmbeddingVideo => "Embedding subtitles into video",
            PipelineState::Completed => "Completed",
            PipelineState::Failed => "",
        }
    }

    /// A collaborator call may be in flight
    pub fn is_working(self) -> bool {
        matches!(
            self,
            PipelineState::LoadingMedia
                | PipelineState::ExtractingAudio
                | PipelineState::Transcribing
                | PipelineState::Translating
                | PipelineState::Composing
                | PipelineState::EmbeddingVideo
        )
    }

    /// A new run may start from here
    pub fn can_start_run(self) -> bool {
        matches!(
            self,
            PipelineState::Idle | PipelineState::AwaitingReview | PipelineState::Completed | PipelineState::Failed
        )
    }

    /// Allowed transitions. `Idle` (reset) is reachable from anywhere.
    pub fn can_transition_to(self, next: PipelineState) -> bool {
        use PipelineState::*;

        if next == Idle {
            return true;
        }
        if next == Failed {
            return self.is_working();
        }
        match (self, next) {
            (Idle | AwaitingReview | Completed | Failed, LoadingMedia) => true,
            (LoadingMedia, ExtractingAudio) => true,
            (LoadingMedia, AwaitingReview) => true,
            (ExtractingAudio, Transcribing) => true,
            (Transcribing, Translating | Composing) => true,
            (Translating, Composing) => true,
            (Composing, AwaitingReview) => true,
            (AwaitingReview, EmbeddingVideo | Completed) => true,
            (EmbeddingVideo, Completed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Snapshot of the pipeline for display
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PipelineStatus {
    pub state: PipelineState,
    /// 0-100, never lower than an earlier value of the same run
    pub progress: u8,
    pub step_label: String,
    /// Set only in `Failed`
    pub last_error: Option<String>,
}

impl PipelineStatus {
    pub fn is_failed(&self) -> bool {
        self.state == PipelineState::Failed
    }
}
