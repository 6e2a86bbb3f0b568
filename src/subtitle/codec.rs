/*!
 * Subtitle document codec.
 *
 * Reads and writes the block format used for `.srt` files:
 *
 * ```text
 * 1
 * 00:00:01,000 --> 00:00:04,000
 * First line
 * optional second line
 *
 * 2
 * ...
 * ```
 *
 * Parsing is lenient at the block level (a malformed block is dropped),
 * validation is strict at the document level.
 */

use std::fmt;

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::timestamp::{Timestamp, format_timestamp, parse_timestamp};
use crate::errors::SubtitleError;

// @const: Timing line at the start of a block line
static TIMING_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2,}:\d{2}:\d{2},\d{3}) --> (\d{2,}:\d{2}:\d{2},\d{3})").unwrap()
});

// @const: Timing pattern anywhere in a document
static TIMING_ANYWHERE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{2,}:\d{2}:\d{2},\d{3} --> \d{2,}:\d{2}:\d{2},\d{3}").unwrap()
});

/// Separator between the two timestamps of a timing line
pub const TIMING_SEPARATOR: &str = " --> ";

/// Minimum number of non-blank lines a document needs
const MIN_DOCUMENT_LINES: usize = 3;

/// One timed caption unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionSegment {
    // @field: 1-based position label
    pub index: usize,

    // @field: Display start
    pub start: Timestamp,

    // @field: Display end (exclusive)
    pub end: Timestamp,

    // @field: Original text, may span lines
    pub primary_text: String,

    // @field: Translation, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_text: Option<String>,
}

impl CaptionSegment {
    pub fn new(index: usize, start: Timestamp, end: Timestamp, primary_text: impl Into<String>) -> Self {
        Self {
            index,
            start,
            end,
            primary_text: primary_text.into(),
            secondary_text: None,
        }
    }

    /// Builder-style translation setter
    pub fn with_translation(mut self, text: impl Into<String>) -> Self {
        self.secondary_text = Some(text.into());
        self
    }

    /// Duration in milliseconds, zero when the interval is inverted
    pub fn duration_ms(&self) -> u64 {
        self.end.millis_since(self.start).unwrap_or(0)
    }

    /// Whether `start < end`
    pub fn has_valid_interval(&self) -> bool {
        self.start < self.end
    }

    /// Text body as it will be written for the given options
    pub fn display_text(&self, options: &SerializeOptions) -> &str {
        match (&self.secondary_text, options.bilingual) {
            (Some(_), true) => &self.primary_text,
            (Some(secondary), false) => secondary,
            (None, _) => &self.primary_text,
        }
    }
}

impl fmt::Display for CaptionSegment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.index)?;
        writeln!(f, "{}{}{}", self.start, TIMING_SEPARATOR, self.end)?;
        writeln!(f, "{}", self.primary_text)?;
        writeln!(f)
    }
}

/// Options controlling text-body composition on serialize
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializeOptions {
    /// Emit original and translation together
    pub bilingual: bool,
}

impl SerializeOptions {
    pub fn bilingual() -> Self {
        Self { bilingual: true }
    }
}

/// Normalize caption text so it fits inside one block.
///
/// Blank lines are removed and trailing whitespace is trimmed from each line.
/// Returns `None` when nothing is left.
pub fn clean_caption_text(text: &str) -> Option<String> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty())
        .collect();
    if lines.is_empty() { None } else { Some(lines.join("\n")) }
}

/// Parse raw subtitle text into segments in document order.
///
/// Blocks that lack an integer index line, a timing line, or at least one
/// text line are dropped. Trailing whitespace on every line is trimmed, so
/// text lines ending in spaces come back without them.
pub fn parse(text: &str) -> Vec<CaptionSegment> {
    let normalized = text.trim_start_matches('\u{feff}').replace("\r\n", "\n");

    let mut segments = Vec::new();
    let mut block: Vec<&str> = Vec::new();

    for line in normalized.split('\n').chain(std::iter::once("")) {
        if line.trim().is_empty() {
            if !block.is_empty() {
                match parse_block(&block) {
                    Some(segment) => segments.push(segment),
                    None => debug!("Dropping malformed subtitle block starting with {:?}", block[0]),
                }
                block.clear();
            }
            continue;
        }
        block.push(line.trim_end());
    }

    segments
}

fn parse_block(lines: &[&str]) -> Option<CaptionSegment> {
    if lines.len() < 3 {
        return None;
    }

    let index = lines[0].trim().parse::<usize>().ok()?;

    let caps = TIMING_LINE_REGEX.captures(lines[1].trim())?;
    let start = parse_timestamp(caps.get(1)?.as_str()).ok()?;
    let end = parse_timestamp(caps.get(2)?.as_str()).ok()?;

    Some(CaptionSegment {
        index,
        start: Timestamp::from_millis(start),
        end: Timestamp::from_millis(end),
        primary_text: lines[2..].join("\n"),
        secondary_text: None,
    })
}

/// Serialize segments in document order.
///
/// The printed index is the 1-based position, not the stored `index`.
pub fn serialize(segments: &[CaptionSegment], options: &SerializeOptions) -> String {
    let mut out = String::new();

    for (position, segment) in segments.iter().enumerate() {
        out.push_str(&(position + 1).to_string());
        out.push('\n');
        out.push_str(&format_timestamp(segment.start.as_millis()));
        out.push_str(TIMING_SEPARATOR);
        out.push_str(&format_timestamp(segment.end.as_millis()));
        out.push('\n');
        out.push_str(segment.display_text(options));
        out.push('\n');
        if options.bilingual {
            if let Some(secondary) = &segment.secondary_text {
                out.push_str(secondary);
                out.push('\n');
            }
        }
        out.push('\n');
    }

    out
}

/// A segment that starts before its predecessor ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapWarning {
    /// Index of the later segment
    pub index: usize,
    /// Index of the segment it overlaps
    pub previous_index: usize,
    /// Overlap length in milliseconds
    pub overlap_ms: u64,
}

impl fmt::Display for OverlapWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Segment {} overlaps with previous segment {} by {}ms",
            self.index, self.previous_index, self.overlap_ms
        )
    }
}

/// Successful validation outcome
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedDocument {
    /// Parsed segments in document order
    pub segments: Vec<CaptionSegment>,
    /// End timestamp of the last segment
    pub duration: Timestamp,
    /// Number of segments
    pub count: usize,
    /// Non-fatal overlap findings
    pub warnings: Vec<OverlapWarning>,
}

/// Validate subtitle text and return its parsed segments.
pub fn validate(text: &str) -> Result<ValidatedDocument, SubtitleError> {
    if text.trim().is_empty() {
        return Err(SubtitleError::EmptyInput);
    }

    let lines = text.lines().filter(|l| !l.trim().is_empty()).count();
    if lines < MIN_DOCUMENT_LINES {
        return Err(SubtitleError::TooShort { lines });
    }

    if !TIMING_ANYWHERE_REGEX.is_match(text) {
        return Err(SubtitleError::MissingTimingPattern);
    }

    let segments = parse(text);
    if segments.is_empty() {
        return Err(SubtitleError::NoSegments);
    }

    if let Some(bad) = segments.iter().find(|s| !s.has_valid_interval()) {
        return Err(SubtitleError::InvalidInterval {
            index: bad.index,
            start: bad.start.to_string(),
            end: bad.end.to_string(),
        });
    }

    let warnings = find_overlaps(&segments);
    for warning in &warnings {
        warn!("{}", warning);
    }

    let duration = segments.last().map(|s| s.end).unwrap_or_default();
    let count = segments.len();

    Ok(ValidatedDocument {
        segments,
        duration,
        count,
        warnings,
    })
}

/// Validate raw bytes; anything that is not UTF-8 counts as empty input.
pub fn validate_bytes(bytes: &[u8]) -> Result<ValidatedDocument, SubtitleError> {
    let text = std::str::from_utf8(bytes).map_err(|_| SubtitleError::EmptyInput)?;
    validate(text)
}

/// Overlaps between each segment and its predecessor, in document order.
pub fn find_overlaps(segments: &[CaptionSegment]) -> Vec<OverlapWarning> {
    segments
        .windows(2)
        .filter_map(|pair| {
            let (previous, current) = (&pair[0], &pair[1]);
            previous.end.millis_since(current.start).filter(|ms| *ms > 0).map(|overlap_ms| OverlapWarning {
                index: current.index,
                previous_index: previous.index,
                overlap_ms,
            })
        })
        .collect()
}

/// Writing systems detected in caption text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Script {
    Chinese,
    Japanese,
    Korean,
    Latin,
}

impl Script {
    pub fn name(&self) -> &'static str {
        match self {
            Script::Chinese => "Chinese",
            Script::Japanese => "Japanese",
            Script::Korean => "Korean",
            Script::Latin => "Latin",
        }
    }

    fn of(c: char) -> Option<Script> {
        match c {
            '\u{4e00}'..='\u{9fff}' => Some(Script::Chinese),
            '\u{3040}'..='\u{309f}' | '\u{30a0}'..='\u{30ff}' => Some(Script::Japanese),
            '\u{ac00}'..='\u{d7af}' => Some(Script::Korean),
            'a'..='z' | 'A'..='Z' => Some(Script::Latin),
            _ => None,
        }
    }
}

/// Summary of a valid subtitle document
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentInfo {
    pub segment_count: usize,
    pub duration: Timestamp,
    pub formatted_duration: String,
    pub scripts: Vec<Script>,
    pub average_segment_ms: u64,
}

impl DocumentInfo {
    /// Summarize text, or `None` if it does not validate
    pub fn from_text(text: &str) -> Option<Self> {
        validate(text).ok().map(|doc| Self::from_validated(&doc))
    }

    pub fn from_validated(doc: &ValidatedDocument) -> Self {
        let mut scripts: Vec<Script> = doc
            .segments
            .iter()
            .flat_map(|s| s.primary_text.chars())
            .filter_map(Script::of)
            .collect();
        scripts.sort();
        scripts.dedup();

        let total_ms: u64 = doc.segments.iter().map(CaptionSegment::duration_ms).sum();
        let average_segment_ms = if doc.count == 0 { 0 } else { total_ms / doc.count as u64 };

        Self {
            segment_count: doc.count,
            duration: doc.duration,
            formatted_duration: doc.duration.to_string(),
            scripts,
            average_segment_ms,
        }
    }
}
