/*!
 * Per-media pipeline context: what was selected, how to process it, and
 * what has been produced so far.
 */

use bytes::Bytes;

use crate::app_config::{Config, SubtitleStyle};
use crate::language_utils;
use crate::providers::{MediaData, MediaRef, TranscriptionOptions};
use crate::subtitle::{CaptionSegment, SerializeOptions};

/// Settings resolved for one media selection
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Spoken language code or `auto`
    pub source_language: String,
    /// Target language code or `none`
    pub target_language: String,
    pub bilingual: bool,
    pub transcription_model: String,
    pub translation_model: String,
    pub style: SubtitleStyle,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for PipelineConfig {
    fn from(config: &Config) -> Self {
        Self {
            source_language: config.source_language.clone(),
            target_language: config.target_language.clone(),
            bilingual: config.bilingual,
            transcription_model: config.provider.transcription_model.clone(),
            translation_model: config.provider.translation_model.clone(),
            style: config.style.clone(),
        }
    }
}

impl PipelineConfig {
    /// Whether the translation step runs
    pub fn translation_enabled(&self) -> bool {
        !language_utils::is_no_translation(&self.target_language)
    }

    /// Bilingual output only applies when something is translated
    pub fn effective_bilingual(&self) -> bool {
        self.bilingual && self.translation_enabled()
    }

    pub fn serialize_options(&self) -> SerializeOptions {
        SerializeOptions {
            bilingual: self.effective_bilingual(),
        }
    }

    pub fn transcription_options(&self) -> TranscriptionOptions {
        TranscriptionOptions {
            model: self.transcription_model.clone(),
            language: language_utils::transcription_language(&self.source_language),
        }
    }
}

/// Outputs of the pipeline
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Artifacts {
    /// Final subtitle text
    pub subtitles: Option<String>,
    /// Video with subtitles embedded
    pub video: Option<Bytes>,
}

/// Everything known about the current media selection
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub media: MediaRef,
    pub config: PipelineConfig,
    /// Media bytes once loaded
    pub media_data: Option<MediaData>,
    /// Current document, empty until transcription finishes
    pub document: Vec<CaptionSegment>,
    pub artifacts: Artifacts,
    /// Session generation this context was created under
    pub generation: u64,
}

impl PipelineContext {
    pub fn new(media: MediaRef, config: PipelineConfig, generation: u64) -> Self {
        Self {
            media,
            config,
            media_data: None,
            document: Vec::new(),
            artifacts: Artifacts::default(),
            generation,
        }
    }

    /// Drop everything produced, keeping the selection and settings
    pub fn clear_outputs(&mut self) {
        self.media_data = None;
        self.document.clear();
        self.artifacts = Artifacts::default();
    }
}
