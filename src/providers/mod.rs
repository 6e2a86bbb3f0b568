/*!
 * Collaborators used by the captioning pipeline.
 *
 * The pipeline only sees the traits in this module; the concrete
 * implementations live in submodules:
 * - `openai`: OpenAI-compatible transcription and translation client
 * - `ffmpeg`: audio extraction and subtitle embedding via the `ffmpeg` binary
 * - `mock`: scriptable in-memory collaborators for tests
 *
 * Media loading from the local file system is in `file_utils::FsMediaLoader`.
 */

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt::Debug;
use std::path::PathBuf;

use crate::app_config::SubtitleStyle;
use crate::errors::ProviderError;

pub mod ffmpeg;
pub mod mock;
pub mod openai;

/// Where the selected media comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaRef {
    /// A file on disk
    Path(PathBuf),
    /// Bytes already in memory, with a display name
    Memory { name: String, bytes: Bytes },
}

impl MediaRef {
    /// Short name used in logs and output file names
    pub fn name(&self) -> String {
        match self {
            MediaRef::Path(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string()),
            MediaRef::Memory { name, .. } => name.clone(),
        }
    }
}

impl From<PathBuf> for MediaRef {
    fn from(path: PathBuf) -> Self {
        MediaRef::Path(path)
    }
}

/// Loaded media content
#[derive(Debug, Clone)]
pub struct MediaData {
    pub name: String,
    pub bytes: Bytes,
}

/// Extracted audio track (16 kHz mono PCM WAV)
#[derive(Debug, Clone)]
pub struct AudioTrack {
    pub file_name: String,
    pub wav: Bytes,
}

/// Options for a transcription request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionOptions {
    /// Model identifier
    pub model: String,
    /// Spoken language, `None` to let the model detect it
    pub language: Option<String>,
}

/// One recognised span of speech, times in seconds
#[derive(Debug, Clone, PartialEq)]
pub struct TranscribedSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl TranscribedSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// Reads the bytes behind a media reference
#[async_trait]
pub trait MediaLoader: Send + Sync + Debug {
    async fn load(&self, media: &MediaRef) -> Result<MediaData, ProviderError>;
}

/// Turns video into a speech-ready audio track
#[async_trait]
pub trait AudioExtractor: Send + Sync + Debug {
    /// Prepare the extractor; calling it again is a no-op
    async fn ensure_ready(&self) -> Result<(), ProviderError>;

    async fn extract_audio(&self, media: &MediaData) -> Result<AudioTrack, ProviderError>;
}

/// Speech-to-text
#[async_trait]
pub trait Transcriber: Send + Sync + Debug {
    async fn transcribe(
        &self,
        audio: &AudioTrack,
        options: &TranscriptionOptions,
    ) -> Result<Vec<TranscribedSegment>, ProviderError>;
}

/// Machine translation of a single caption
#[async_trait]
pub trait Translator: Send + Sync + Debug {
    async fn translate(&self, text: &str, target_language: &str, model: &str) -> Result<String, ProviderError>;
}

/// Puts subtitles into a video
#[async_trait]
pub trait Muxer: Send + Sync + Debug {
    /// Prepare the muxer; calling it again is a no-op
    async fn ensure_ready(&self) -> Result<(), ProviderError>;

    async fn mux(&self, media: &MediaData, subtitles: &str, style: &SubtitleStyle) -> Result<Bytes, ProviderError>;
}
