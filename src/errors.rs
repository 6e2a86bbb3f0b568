/*!
 * Error types for the autocaption application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions:
 * - `SubtitleError`: timestamp, document validation and segment editing failures
 * - `ProviderError`: failures reported by external collaborators
 * - `PipelineError`: failures of a pipeline run or of a pipeline command
 * - `AppError`: top-level wrapper used by the binary
 */

use thiserror::Error;

/// Errors that can occur when working with subtitle text or segments.
///
/// These are local errors: they are reported to the caller attempting the
/// parse or edit and never change document or pipeline state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubtitleError {
    /// Text does not match the `HH:MM:SS,mmm` grammar
    #[error("Malformed timestamp: '{0}'")]
    MalformedTimestamp(String),

    /// Input is empty or not textual
    #[error("Content is empty or invalid")]
    EmptyInput,

    /// Fewer than three non-blank lines
    #[error("File too short to be a valid subtitle document ({lines} non-blank lines)")]
    TooShort {
        /// Number of non-blank lines found
        lines: usize,
    },

    /// No timing line anywhere in the text
    #[error("Invalid timestamp format: no timing line found")]
    MissingTimingPattern,

    /// Text had a timing line but no block parsed
    #[error("No valid subtitle segments found")]
    NoSegments,

    /// A segment does not start before it ends
    #[error("Invalid timestamp in segment {index}: start {start} must be before end {end}")]
    InvalidInterval {
        /// Index of the offending segment
        index: usize,
        /// Formatted start timestamp
        start: String,
        /// Formatted end timestamp
        end: String,
    },

    /// Segment index outside the document
    #[error("Segment {index} does not exist (document has {count} segments)")]
    SegmentNotFound {
        /// Requested 1-based index
        index: usize,
        /// Number of segments in the document
        count: usize,
    },

    /// Segment text would become empty
    #[error("Subtitle text for segment {0} cannot be empty")]
    EmptyText(usize),
}

/// Errors that can occur when calling an external collaborator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// A local tool (ffmpeg) is missing or failed to start
    #[error("Tool unavailable: {0}")]
    ToolUnavailable(String),

    /// A local tool ran and reported failure
    #[error("Tool failed: {0}")]
    ToolFailed(String),

    /// Local I/O failure
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ProviderError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

/// Errors that can occur when driving the captioning pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// A run is already in flight for this context
    #[error("Pipeline is busy ({state})")]
    Busy {
        /// Label of the state that blocked the request
        state: String,
    },

    /// No media has been selected
    #[error("No media selected")]
    NoMedia,

    /// The command needs a document under review
    #[error("No subtitles are awaiting review ({state})")]
    NotAwaitingReview {
        /// Label of the current state
        state: String,
    },

    /// Reading the selected media failed
    #[error("Failed to read media: {0}")]
    MediaRead(String),

    /// Extracting the audio track failed
    #[error("Failed to extract audio from video: {0}")]
    AudioExtraction(String),

    /// Transcription failed
    #[error("Transcription failed: {0}")]
    Transcription(String),

    /// Translation of one segment failed (recovered inside a run)
    #[error("Translation failed: {0}")]
    Translation(String),

    /// Composing the subtitle document failed
    #[error("Failed to compose subtitles: {0}")]
    Composition(SubtitleError),

    /// Embedding subtitles into the video failed
    #[error("Failed to embed subtitles into video: {0}")]
    Muxing(String),

    /// Imported subtitle text was rejected
    #[error("Invalid subtitle file: {0}")]
    Validation(#[from] SubtitleError),
}

impl PipelineError {
    /// Whether this error ends the current run in the `Failed` state
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MediaRead(_)
                | Self::AudioExtraction(_)
                | Self::Transcription(_)
                | Self::Composition(_)
                | Self::Muxing(_)
        )
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from the pipeline
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
