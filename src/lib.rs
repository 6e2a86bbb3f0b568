/*!
 * # autocaption
 *
 * A Rust library for generating subtitles for videos with speech-to-text and AI translation.
 *
 * ## Features
 *
 * - Extract the audio track of a video with ffmpeg
 * - Transcribe speech with an OpenAI-compatible Whisper endpoint
 * - Translate each caption with a chat model, one segment at a time
 * - Bilingual SRT output (original over translation)
 * - Review and edit subtitles before embedding
 * - Burned-in or soft subtitle tracks
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `subtitle`: SRT timestamps, parsing, serialization, validation and the editable segment store
 * - `pipeline`: the generation state machine and its progress reporting
 * - `providers`: collaborator traits and their implementations:
 *   - `providers::openai`: transcription and translation client
 *   - `providers::ffmpeg`: audio extraction and subtitle muxing
 *   - `providers::mock`: scripted collaborators for tests
 * - `app_config`: Configuration management
 * - `app_controller`: Command-line workflows on top of the pipeline
 * - `file_utils`: File system operations
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod pipeline;
pub mod providers;
pub mod subtitle;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{AppError, PipelineError, ProviderError, SubtitleError};
pub use language_utils::{get_language_name, normalize_to_part2t};
pub use pipeline::{Orchestrator, PipelineState, PipelineStatus, RunOutcome};
pub use subtitle::{CaptionSegment, SegmentStore, Timestamp};
