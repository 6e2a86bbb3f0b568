use anyhow::{Context, Result, anyhow};
use log::{LevelFilter, warn};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::language_utils;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Spoken language code, or `auto`
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Translation target code, or `none`
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Show original and translated text together
    #[serde(default = "default_true")]
    pub bilingual: bool,

    /// Transcription and translation service
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Subtitle appearance when embedding
    #[serde(default)]
    pub style: SubtitleStyle,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// OpenAI-compatible service configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProviderConfig {
    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL, `/v1` is appended when missing
    #[serde(default = "default_base_url")]
    pub base_url: String,

    // @field: Speech-to-text model
    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,

    // @field: Chat model used for translation
    #[serde(default = "default_translation_model")]
    pub translation_model: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            transcription_model: default_transcription_model(),
            translation_model: default_translation_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Subtitle appearance used by the muxer
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SubtitleStyle {
    /// Burn subtitles into the picture instead of adding a subtitle track
    #[serde(default = "default_true")]
    pub hard_sub: bool,

    #[serde(default = "default_font_size")]
    pub font_size: u32,

    /// Color name (white, black, red, green, blue, yellow, gray)
    #[serde(default = "default_font_color")]
    pub font_color: String,

    #[serde(default = "default_outline_color")]
    pub outline_color: String,

    #[serde(default = "default_outline_width")]
    pub outline_width: u32,
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            hard_sub: true,
            font_size: default_font_size(),
            font_color: default_font_color(),
            outline_color: default_outline_color(),
            outline_width: default_outline_width(),
        }
    }
}

impl SubtitleStyle {
    /// Check that the style can be rendered
    pub fn validate(&self) -> Result<()> {
        if self.font_size == 0 || self.font_size > 200 {
            return Err(anyhow!("Font size must be between 1 and 200, got {}", self.font_size));
        }
        if self.outline_width > 20 {
            return Err(anyhow!("Outline width must be at most 20, got {}", self.outline_width));
        }
        if self.font_color.trim().is_empty() || self.outline_color.trim().is_empty() {
            return Err(anyhow!("Subtitle colors cannot be empty"));
        }
        Ok(())
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    language_utils::AUTO_DETECT.to_string()
}

fn default_target_language() -> String {
    "zh".to_string()
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

fn default_translation_model() -> String {
    "o1-mini".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_font_size() -> u32 {
    24
}

fn default_font_color() -> String {
    "white".to_string()
}

fn default_outline_color() -> String {
    "black".to_string()
}

fn default_outline_width() -> u32 {
    2
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        language_utils::validate_source_language(&self.source_language)
            .context(format!("Invalid source language '{}'", self.source_language))?;
        language_utils::validate_target_language(&self.target_language)
            .context(format!("Invalid target language '{}'", self.target_language))?;

        if self.provider.base_url.trim().is_empty() {
            return Err(anyhow!("Provider base URL cannot be empty"));
        }
        if self.provider.timeout_secs == 0 {
            return Err(anyhow!("Provider timeout must be greater than zero"));
        }

        self.style.validate()
    }

    /// Validate everything `validate` checks plus what generation needs
    pub fn validate_for_generation(&self) -> Result<()> {
        self.validate()?;
        if self.provider.api_key.trim().is_empty() {
            return Err(anyhow!("API key is required to generate subtitles (set it in the config file or OPENAI_API_KEY)"));
        }
        Ok(())
    }

    /// Whether segments will be translated
    pub fn translation_enabled(&self) -> bool {
        !language_utils::is_no_translation(&self.target_language)
    }

    /// Load a config file, creating it with defaults when missing
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path).context(format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .context(format!("Failed to parse config file: {}", path.display()))?;
            Ok(config)
        } else {
            warn!("Config file not found at '{}', creating default config.", path.display());
            let config = Config::default();
            config.save(path)?;
            Ok(config)
        }
    }

    /// Write the config as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        std::fs::write(path, config_json)
            .context(format!("Failed to write config to file: {}", path.display()))?;
        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            bilingual: true,
            provider: ProviderConfig::default(),
            style: SubtitleStyle::default(),
            log_level: LogLevel::default(),
        }
    }
}
