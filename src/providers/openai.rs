/*!
 * OpenAI-compatible client used for transcription and translation.
 *
 * Works against api.openai.com and any server exposing the same
 * `/v1/audio/transcriptions`, `/v1/chat/completions` and `/v1/models`
 * routes.
 */

use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::app_config::ProviderConfig;
use crate::errors::ProviderError;
use crate::language_utils;
use crate::providers::{AudioTrack, TranscribedSegment, Transcriber, TranscriptionOptions, Translator};

/// Default service root
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI client
#[derive(Debug, Clone)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// Normalized service root ending in `/v1`
    base_url: String,
}

/// Chat message format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Chat completion request
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
}

impl ChatRequest {
    /// Build a single-prompt translation request.
    ///
    /// Reasoning models (`o1*`) take `max_completion_tokens` and reject
    /// `temperature`; the others take both `temperature` and `max_tokens`.
    pub fn translation(model: &str, prompt: String, source_len: usize) -> Self {
        let budget = token_budget(source_len);
        let reasoning = model.starts_with("o1");
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt,
            }],
            temperature: if reasoning { None } else { Some(0.3) },
            max_tokens: if reasoning { None } else { Some(budget) },
            max_completion_tokens: if reasoning { Some(budget) } else { None },
        }
    }
}

/// Chat completion response
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

/// `verbose_json` transcription response
#[derive(Debug, Deserialize)]
pub struct TranscriptionResponse {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub segments: Option<Vec<TranscriptionSegment>>,
}

#[derive(Debug, Deserialize)]
pub struct TranscriptionSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl TranscriptionResponse {
    /// Segments with trimmed text; a response without segments becomes one
    /// zero-length segment holding the whole text
    pub fn into_segments(self) -> Vec<TranscribedSegment> {
        match self.segments {
            Some(segments) => segments
                .into_iter()
                .map(|s| TranscribedSegment::new(s.start, s.end, s.text.trim()))
                .collect(),
            None => vec![TranscribedSegment::new(0.0, 0.0, self.text.trim())],
        }
    }
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

/// Models offered by a server, grouped by use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCatalog {
    /// Models usable for translation, preferred first
    pub chat: Vec<String>,
    /// Speech-to-text models
    pub whisper: Vec<String>,
    /// Every model id returned
    pub all: Vec<String>,
}

// @const: Chat model id prefixes (matched case-insensitively)
const CHAT_MODEL_PREFIXES: &[&str] = &[
    "gpt-", "o1-", "claude-", "llama", "qwen", "yi-", "baichuan", "chatglm", "internlm", "deepseek", "mistral",
    "mixtral", "gemma", "phi-",
];

// @const: Preferred translation models, best first
const CHAT_MODEL_PRIORITY: &[&str] = &["o1-mini", "o1-preview", "gpt-4o", "gpt-4o-mini", "gpt-4-turbo", "gpt-4", "gpt-3.5-turbo"];

const FALLBACK_CHAT_MODELS: &[&str] = &["o1-mini", "gpt-4o", "gpt-4o-mini", "gpt-3.5-turbo"];
const FALLBACK_WHISPER_MODELS: &[&str] = &["whisper-1"];

pub fn is_whisper_model(id: &str) -> bool {
    id.contains("whisper")
}

pub fn is_chat_model(id: &str) -> bool {
    let lower = id.to_lowercase();
    !is_whisper_model(&lower) && CHAT_MODEL_PREFIXES.iter().any(|p| lower.starts_with(p))
}

impl ModelCatalog {
    /// Group model ids; empty groups fall back to well-known defaults
    pub fn from_ids(ids: Vec<String>) -> Self {
        let mut chat: Vec<String> = ids.iter().filter(|id| is_chat_model(id)).cloned().collect();
        let whisper: Vec<String> = ids.iter().filter(|id| is_whisper_model(id)).cloned().collect();

        chat.sort_by_key(|id| {
            let rank = CHAT_MODEL_PRIORITY
                .iter()
                .position(|p| *p == id.as_str())
                .unwrap_or(CHAT_MODEL_PRIORITY.len());
            (rank, id.clone())
        });

        Self {
            chat: if chat.is_empty() { to_strings(FALLBACK_CHAT_MODELS) } else { chat },
            whisper: if whisper.is_empty() { to_strings(FALLBACK_WHISPER_MODELS) } else { whisper },
            all: ids,
        }
    }

    /// Catalog used when the server cannot be queried
    pub fn fallback() -> Self {
        Self::from_ids(Vec::new())
    }
}

fn to_strings(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

/// Output token allowance for translating `source_len` characters
pub fn token_budget(source_len: usize) -> u32 {
    let scaled = (source_len as f64 * 1.5).ceil() as u32;
    scaled.max(50)
}

/// Prompt asking for a bare translation
pub fn translation_prompt(text: &str, target_language: &str) -> String {
    let language = language_utils::get_language_name(target_language).unwrap_or_else(|_| target_language.to_string());
    format!(
        "Please translate the following text to {}. Only return the translated text without any explanations:\n\n{}",
        language, text
    )
}

/// Strip a trailing slash and make sure the root ends in `/v1`
pub fn normalize_base_url(base_url: &str) -> Result<String, ProviderError> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return Ok(DEFAULT_BASE_URL.to_string());
    }

    let parsed = Url::parse(trimmed).map_err(|e| ProviderError::RequestFailed(format!("Invalid base URL '{}': {}", trimmed, e)))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ProviderError::RequestFailed(format!("Unsupported URL scheme '{}'", parsed.scheme())));
    }

    let mut normalized = parsed.as_str().trim_end_matches('/').to_string();
    if !normalized.ends_with("/v1") {
        normalized.push_str("/v1");
    }
    Ok(normalized)
}

impl OpenAI {
    /// Create a new client
    pub fn new(api_key: impl Into<String>, base_url: &str, timeout_secs: u64) -> Result<Self, ProviderError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            base_url: normalize_base_url(base_url)?,
        })
    }

    /// Create a client from the provider section of the config
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        Self::new(config.api_key.clone(), &config.base_url, config.timeout_secs)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Complete a chat request
    pub async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let response = Self::check_status(response).await?;
        response
            .json::<ChatResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))
    }

    /// Send audio to the transcription endpoint
    pub async fn transcribe_wav(
        &self,
        audio: &AudioTrack,
        options: &TranscriptionOptions,
    ) -> Result<TranscriptionResponse, ProviderError> {
        let url = format!("{}/audio/transcriptions", self.base_url);
        let part = Part::bytes(audio.wav.to_vec())
            .file_name(audio.file_name.clone())
            .mime_str("audio/wav")
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let mut form = Form::new()
            .part("file", part)
            .text("model", options.model.clone())
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "segment");
        if let Some(language) = &options.language {
            form = form.text("language", language.clone());
        }

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let response = Self::check_status(response).await?;
        response
            .json::<TranscriptionResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))
    }

    /// List the models the server offers
    pub async fn list_models(&self) -> Result<ModelCatalog, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let response = Self::check_status(response).await?;
        let list = response
            .json::<ModelList>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        Ok(ModelCatalog::from_ids(list.data.into_iter().map(|m| m.id).collect()))
    }

    /// Check that a model can translate a short phrase
    pub async fn test_translation_model(&self, model: &str) -> bool {
        match self.translate("Hello world", "zh", model).await {
            Ok(_) => true,
            Err(e) => {
                debug!("Translation model {} test failed: {}", model, e);
                false
            }
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to get error response text".to_string());
        error!("OpenAI API error ({}): {}", status, error_text);

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ProviderError::AuthenticationError(error_text));
        }
        Err(ProviderError::ApiError {
            status_code: status.as_u16(),
            message: error_text,
        })
    }
}

#[async_trait]
impl Transcriber for OpenAI {
    async fn transcribe(
        &self,
        audio: &AudioTrack,
        options: &TranscriptionOptions,
    ) -> Result<Vec<TranscribedSegment>, ProviderError> {
        debug!("Transcribing {} ({} bytes) with {}", audio.file_name, audio.wav.len(), options.model);
        Ok(self.transcribe_wav(audio, options).await?.into_segments())
    }
}

#[async_trait]
impl Translator for OpenAI {
    async fn translate(&self, text: &str, target_language: &str, model: &str) -> Result<String, ProviderError> {
        let request = ChatRequest::translation(model, translation_prompt(text, target_language), text.chars().count());
        let response = self.complete(&request).await?;
        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| ProviderError::ParseError("Response contained no choices".to_string()))
    }
}
