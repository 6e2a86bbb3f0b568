/*!
 * Progress accounting for pipeline runs.
 *
 * A generation run is weighted as:
 * - loading media: 0-20
 * - extracting audio: 20
 * - transcribing: 20-50
 * - translating: 50-95, split evenly per segment
 * - composing: 95
 * - awaiting review: 100
 *
 * Embedding reports on its own 0-100 scale.
 */

use serde::Serialize;

use super::state::PipelineState;

pub const LOADING_START: u8 = 0;
pub const COLLABORATORS_READY: u8 = 10;
pub const MEDIA_LOADED: u8 = 20;
pub const EXTRACTION_START: u8 = 20;
pub const TRANSCRIPTION_START: u8 = 20;
pub const TRANSCRIPTION_DONE: u8 = 50;
pub const TRANSLATION_START: u8 = 50;
pub const TRANSLATION_SPAN: u8 = 45;
pub const COMPOSING: u8 = 95;
pub const REVIEW_READY: u8 = 100;

pub const EMBED_START: u8 = 0;
pub const EMBED_READY: u8 = 10;
pub const EMBED_MUXING: u8 = 40;
pub const EMBED_DONE: u8 = 100;

/// Progress after translating segment `done_index` (0-based) of `total`
pub fn translation_progress(done_index: usize, total: usize) -> u8 {
    if total == 0 {
        return TRANSLATION_START + TRANSLATION_SPAN;
    }
    let done = (done_index + 1).min(total);
    let share = done * TRANSLATION_SPAN as usize / total;
    TRANSLATION_START + share as u8
}

/// One status change, sent to whoever listens
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    /// Session generation the event belongs to
    pub generation: u64,
    pub state: PipelineState,
    pub progress: u8,
    pub label: String,
    /// Present when the run failed
    pub error: Option<String>,
}

/// Clamps reported progress so a run never goes backwards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressTracker {
    last: u8,
}

impl ProgressTracker {
    /// Start a new scale at zero
    pub fn restart(&mut self) {
        self.last = 0;
    }

    /// Record a value and return what should be reported
    pub fn advance(&mut self, value: u8) -> u8 {
        self.last = self.last.max(value.min(100));
        self.last
    }

    pub fn current(&self) -> u8 {
        self.last
    }
}
