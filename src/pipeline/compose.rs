/*!
 * Turning collaborator output into a subtitle document.
 */

use log::warn;

use crate::errors::{PipelineError, ProviderError};
use crate::providers::TranscribedSegment;
use crate::subtitle::{CaptionSegment, SerializeOptions, Timestamp, codec};

/// Length given to a recognised span that has no positive duration
pub const MIN_SEGMENT_MS: u64 = 1_000;

/// Build caption segments from transcription output.
///
/// Spans without text are dropped. A span whose end is not after its start
/// is stretched to `MIN_SEGMENT_MS`. Negative or NaN times count as zero and
/// infinite ones drop the span.
pub fn captions_from_transcription(spans: Vec<TranscribedSegment>) -> Result<Vec<CaptionSegment>, PipelineError> {
    let mut captions = Vec::with_capacity(spans.len());

    for span in spans {
        let Some(text) = codec::clean_caption_text(span.text.trim()) else {
            warn!("Skipping empty transcription segment at {:.3}s", span.start);
            continue;
        };

        let (Some(start), Some(end)) = (
            Timestamp::from_secs_f64(span.start.max(0.0)),
            Timestamp::from_secs_f64(span.end.max(0.0)),
        ) else {
            warn!("Skipping transcription segment with invalid times: {:?}", span);
            continue;
        };

        let end = if end > start { end } else { start.saturating_add_millis(MIN_SEGMENT_MS) };
        captions.push(CaptionSegment::new(captions.len() + 1, start, end, text));
    }

    if captions.is_empty() {
        return Err(PipelineError::Transcription("no speech was recognised".to_string()));
    }
    Ok(captions)
}

/// Text stored in place of a translation that failed, kept on one line
pub fn translation_failure_text(error: &ProviderError) -> String {
    let reason = error.to_string().split_whitespace().collect::<Vec<_>>().join(" ");
    format!("[Translation failed: {}]", reason)
}

/// Clean a translator reply; a reply with no text counts as a failure
pub fn translated_text(reply: Result<String, ProviderError>) -> Result<String, ProviderError> {
    let reply = reply?;
    codec::clean_caption_text(&reply).ok_or_else(|| ProviderError::ParseError("empty translation".to_string()))
}

/// Serialize segments and check the result is a valid document
pub fn compose_document(segments: &[CaptionSegment], options: &SerializeOptions) -> Result<String, PipelineError> {
    let text = codec::serialize(segments, options);
    codec::validate(&text).map_err(PipelineError::Composition)?;
    Ok(text)
}
