/*!
 * Mock collaborators for testing.
 *
 * `MockProvider` implements every collaborator trait. Each call kind has
 * its own `MockBehavior`:
 * - `Working` - always succeeds
 * - `Failing` - always fails with an error
 * - `Intermittent { fail_every }` - fails every Nth call
 * - `FailOn { call }` - fails only the given (1-based) call
 * - `Slow { delay_ms }` - succeeds after a delay
 * - `Gated` - waits until `release()` is called
 *
 * Clones share call counters, recorded inputs and the gate.
 */

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

use crate::app_config::SubtitleStyle;
use crate::errors::ProviderError;
use crate::providers::{
    AudioExtractor, AudioTrack, MediaData, MediaLoader, MediaRef, Muxer, TranscribedSegment, Transcriber,
    TranscriptionOptions, Translator,
};

/// Behavior mode for one kind of mock call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Always fails with an error
    Failing,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Fails only the Nth request (1-based)
    FailOn { call: usize },
    /// Simulates slow response
    Slow { delay_ms: u64 },
    /// Blocks until the gate is released
    Gated,
}

/// Kind of collaborator call, used for counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockCall {
    Load,
    EnsureReady,
    Extract,
    Transcribe,
    Translate,
    Mux,
}

const CALL_KINDS: usize = 6;

impl MockCall {
    fn slot(self) -> usize {
        match self {
            MockCall::Load => 0,
            MockCall::EnsureReady => 1,
            MockCall::Extract => 2,
            MockCall::Transcribe => 3,
            MockCall::Translate => 4,
            MockCall::Mux => 5,
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    counts: [AtomicUsize; CALL_KINDS],
    translated: Mutex<Vec<String>>,
    transcription_options: Mutex<Vec<TranscriptionOptions>>,
    muxed_subtitles: Mutex<Vec<String>>,
    gate: Notify,
    gate_entered: Notify,
}

/// Scriptable stand-in for every pipeline collaborator
#[derive(Debug, Clone)]
pub struct MockProvider {
    segments: Vec<TranscribedSegment>,
    translation_replies: Vec<String>,
    behaviors: [MockBehavior; CALL_KINDS],
    shared: Arc<Shared>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::working()
    }
}

impl MockProvider {
    /// Create a working mock that transcribes three short sentences
    pub fn working() -> Self {
        Self {
            segments: vec![
                TranscribedSegment::new(0.0, 1.5, "Hello there"),
                TranscribedSegment::new(1.5, 3.0, "How are you"),
                TranscribedSegment::new(3.2, 5.0, "Goodbye"),
            ],
            translation_replies: Vec::new(),
            behaviors: [MockBehavior::Working; CALL_KINDS],
            shared: Arc::new(Shared::default()),
        }
    }

    /// Replace the transcription result
    pub fn with_segments(mut self, segments: Vec<TranscribedSegment>) -> Self {
        self.segments = segments;
        self
    }

    /// Reply with these texts, by call order, instead of tagging the input
    pub fn with_translation_replies<S: Into<String>>(mut self, replies: impl IntoIterator<Item = S>) -> Self {
        self.translation_replies = replies.into_iter().map(Into::into).collect();
        self
    }

    /// Set the behavior for one kind of call
    pub fn with_behavior(mut self, call: MockCall, behavior: MockBehavior) -> Self {
        self.behaviors[call.slot()] = behavior;
        self
    }

    /// Number of calls of a kind made so far
    pub fn calls(&self, call: MockCall) -> usize {
        self.shared.counts[call.slot()].load(Ordering::SeqCst)
    }

    /// Texts passed to `translate`, in call order
    pub fn translated_texts(&self) -> Vec<String> {
        self.shared.translated.lock().clone()
    }

    /// Options passed to `transcribe`, in call order
    pub fn transcription_options(&self) -> Vec<TranscriptionOptions> {
        self.shared.transcription_options.lock().clone()
    }

    /// Subtitle texts passed to `mux`, in call order
    pub fn muxed_subtitles(&self) -> Vec<String> {
        self.shared.muxed_subtitles.lock().clone()
    }

    /// Let one gated call continue
    pub fn release(&self) {
        self.shared.gate.notify_one();
    }

    /// Wait until a gated call is blocked on the gate
    pub async fn wait_until_gated(&self) {
        self.shared.gate_entered.notified().await;
    }

    async fn behave(&self, call: MockCall) -> Result<(), ProviderError> {
        let count = self.shared.counts[call.slot()].fetch_add(1, Ordering::SeqCst);

        match self.behaviors[call.slot()] {
            MockBehavior::Working => Ok(()),
            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: format!("Simulated {:?} failure", call),
                status_code: 500,
            }),
            MockBehavior::Intermittent { fail_every } => {
                if fail_every > 0 && count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    Ok(())
                }
            }
            MockBehavior::FailOn { call: failing } => {
                if count + 1 == failing {
                    Err(ProviderError::RequestFailed(format!("Simulated failure on {:?} call #{}", call, failing)))
                } else {
                    Ok(())
                }
            }
            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                Ok(())
            }
            MockBehavior::Gated => {
                self.shared.gate_entered.notify_one();
                self.shared.gate.notified().await;
                Ok(())
            }
        }
    }
}

#[async_trait]
impl MediaLoader for MockProvider {
    async fn load(&self, media: &MediaRef) -> Result<MediaData, ProviderError> {
        self.behave(MockCall::Load).await?;
        let bytes = match media {
            MediaRef::Memory { bytes, .. } => bytes.clone(),
            MediaRef::Path(_) => Bytes::from_static(b"mock video"),
        };
        Ok(MediaData {
            name: media.name(),
            bytes,
        })
    }
}

#[async_trait]
impl AudioExtractor for MockProvider {
    async fn ensure_ready(&self) -> Result<(), ProviderError> {
        self.behave(MockCall::EnsureReady).await
    }

    async fn extract_audio(&self, _media: &MediaData) -> Result<AudioTrack, ProviderError> {
        self.behave(MockCall::Extract).await?;
        Ok(AudioTrack {
            file_name: "audio.wav".to_string(),
            wav: Bytes::from_static(b"RIFF mock wav"),
        })
    }
}

#[async_trait]
impl Transcriber for MockProvider {
    async fn transcribe(
        &self,
        _audio: &AudioTrack,
        options: &TranscriptionOptions,
    ) -> Result<Vec<TranscribedSegment>, ProviderError> {
        self.shared.transcription_options.lock().push(options.clone());
        self.behave(MockCall::Transcribe).await?;
        Ok(self.segments.clone())
    }
}

#[async_trait]
impl Translator for MockProvider {
    async fn translate(&self, text: &str, target_language: &str, _model: &str) -> Result<String, ProviderError> {
        let call = {
            let mut translated = self.shared.translated.lock();
            translated.push(text.to_string());
            translated.len()
        };
        self.behave(MockCall::Translate).await?;
        Ok(self
            .translation_replies
            .get(call - 1)
            .cloned()
            .unwrap_or_else(|| format!("[{}] {}", target_language, text)))
    }
}

#[async_trait]
impl Muxer for MockProvider {
    async fn ensure_ready(&self) -> Result<(), ProviderError> {
        self.behave(MockCall::EnsureReady).await
    }

    async fn mux(&self, media: &MediaData, subtitles: &str, _style: &SubtitleStyle) -> Result<Bytes, ProviderError> {
        self.shared.muxed_subtitles.lock().push(subtitles.to_string());
        self.behave(MockCall::Mux).await?;
        let mut output = media.bytes.to_vec();
        output.extend_from_slice(subtitles.as_bytes());
        Ok(Bytes::from(output))
    }
}
