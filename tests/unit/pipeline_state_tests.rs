/*!
 * Tests for pipeline states, progress weighting and document composition
 */

use autocaption::errors::{PipelineError, ProviderError};
use autocaption::pipeline::compose::{captions_from_transcription, compose_document, translation_failure_text};
use autocaption::pipeline::progress::{self, ProgressTracker, translation_progress};
use autocaption::pipeline::{PipelineState, PipelineStatus};
use autocaption::providers::TranscribedSegment;
use autocaption::subtitle::{SerializeOptions, codec};

#[test]
fn test_state_workingStates_shouldNotStartRuns() {
    for state in [
        PipelineState::LoadingMedia,
        PipelineState::ExtractingAudio,
        PipelineState::Transcribing,
        PipelineState::Translating,
        PipelineState::Composing,
        PipelineState::EmbeddingVideo,
    ] {
        assert!(state.is_working(), "{}", state);
        assert!(!state.can_start_run(), "{}", state);
    }
}

#[test]
fn test_state_generationPath_shouldBeAllowed() {
    let path = [
        PipelineState::Idle,
        PipelineState::LoadingMedia,
        PipelineState::ExtractingAudio,
        PipelineState::Transcribing,
        PipelineState::Translating,
        PipelineState::Composing,
        PipelineState::AwaitingReview,
        PipelineState::EmbeddingVideo,
        PipelineState::Completed,
    ];
    assert!(path.windows(2).all(|w| w[0].can_transition_to(w[1])));
}

#[test]
fn test_state_shouldRejectSkippingAhead() {
    assert!(!PipelineState::Idle.can_transition_to(PipelineState::Translating));
    assert!(!PipelineState::Transcribing.can_transition_to(PipelineState::AwaitingReview));
    assert!(!PipelineState::Completed.can_transition_to(PipelineState::EmbeddingVideo));
    assert!(!PipelineState::Idle.can_transition_to(PipelineState::Failed));
}

#[test]
fn test_status_default_shouldBeIdleAtZero() {
    let status = PipelineStatus::default();
    assert_eq!(status.state, PipelineState::Idle);
    assert_eq!(status.progress, 0);
    assert!(status.step_label.is_empty());
    assert!(!status.is_failed());
}

#[test]
fn test_status_shouldSerializeForDisplay() {
    let status = PipelineStatus {
        state: PipelineState::Translating,
        progress: 65,
        step_label: "Translating 1/3".to_string(),
        last_error: None,
    };
    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["state"], "Translating");
    assert_eq!(json["progress"], 65);
}

#[test]
fn test_progress_weights_shouldIncreaseAlongGeneration() {
    let weights = [
        progress::LOADING_START,
        progress::COLLABORATORS_READY,
        progress::MEDIA_LOADED,
        progress::EXTRACTION_START,
        progress::TRANSCRIPTION_START,
        progress::TRANSCRIPTION_DONE,
        translation_progress(0, 4),
        translation_progress(3, 4),
        progress::COMPOSING,
        progress::REVIEW_READY,
    ];
    assert!(weights.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(translation_progress(1, 4), 72);
}

#[test]
fn test_tracker_afterRestart_shouldAcceptLowerValues() {
    let mut tracker = ProgressTracker::default();
    tracker.advance(100);
    tracker.restart();
    assert_eq!(tracker.advance(progress::EMBED_READY), 10);
}

#[test]
fn test_composeDocument_fromTranscription_shouldValidate() {
    let segments = captions_from_transcription(vec![
        TranscribedSegment::new(0.0, 2.0, "One"),
        TranscribedSegment::new(2.0, 4.0, "Two"),
    ])
    .unwrap();
    let text = compose_document(&segments, &SerializeOptions::default()).unwrap();
    assert_eq!(codec::validate(&text).unwrap().count, 2);
}

#[test]
fn test_captions_fromEmptyTranscription_shouldFail() {
    assert!(matches!(captions_from_transcription(Vec::new()), Err(PipelineError::Transcription(_))));
}

#[test]
fn test_failureText_shouldBeBracketed() {
    let text = translation_failure_text(&ProviderError::AuthenticationError("bad key".to_string()));
    assert!(text.starts_with("[Translation failed: "));
    assert!(text.ends_with(']'));
    assert!(text.contains("bad key"));
}
