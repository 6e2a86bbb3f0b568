/*!
 * Segment store used while the user reviews generated subtitles.
 *
 * The store owns the segments exclusively and keeps a serialized copy in
 * step with every mutation. Order is edit order: nothing here re-sorts by
 * time, so a user can move dialogue around on purpose.
 */

use std::str::FromStr;

use log::debug;

use super::codec::{self, CaptionSegment, OverlapWarning, SerializeOptions};
use super::timestamp::{Timestamp, parse_timestamp};
use crate::errors::SubtitleError;

/// Length of a segment created by the store
pub const DEFAULT_SEGMENT_MS: u64 = 3_000;

/// Text of a segment created by the store
pub const DEFAULT_SEGMENT_TEXT: &str = "New subtitle text";

/// Which bound of a segment to edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeField {
    Start,
    End,
}

/// A user-supplied time value: either seconds or timestamp text
#[derive(Debug, Clone, PartialEq)]
pub enum TimeInput {
    Seconds(f64),
    Text(String),
}

impl TimeInput {
    /// Resolve to a timestamp
    pub fn resolve(&self) -> Result<Timestamp, SubtitleError> {
        match self {
            TimeInput::Seconds(secs) => Timestamp::from_secs_f64(*secs)
                .ok_or_else(|| SubtitleError::MalformedTimestamp(secs.to_string())),
            TimeInput::Text(text) => {
                let trimmed = text.trim();
                if trimmed.contains(':') {
                    parse_timestamp(trimmed).map(Timestamp::from_millis)
                } else {
                    trimmed
                        .parse::<f64>()
                        .ok()
                        .and_then(Timestamp::from_secs_f64)
                        .ok_or_else(|| SubtitleError::MalformedTimestamp(text.clone()))
                }
            }
        }
    }
}

impl From<f64> for TimeInput {
    fn from(secs: f64) -> Self {
        TimeInput::Seconds(secs)
    }
}

impl From<&str> for TimeInput {
    fn from(text: &str) -> Self {
        TimeInput::Text(text.to_string())
    }
}

impl FromStr for TimeInput {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TimeInput::Text(s.to_string()))
    }
}

/// A problem found in the current document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentIssue {
    /// `start >= end`
    InvalidInterval { index: usize },
    /// Starts before the previous segment ends
    Overlap(OverlapWarning),
}

impl SegmentIssue {
    /// Whether the issue would make validation fail
    pub fn is_error(&self) -> bool {
        matches!(self, SegmentIssue::InvalidInterval { .. })
    }
}

/// Ordered, editable caption segments
#[derive(Debug, Clone)]
pub struct SegmentStore {
    segments: Vec<CaptionSegment>,
    options: SerializeOptions,
    text: String,
}

impl SegmentStore {
    /// Take ownership of a document snapshot
    pub fn new(segments: Vec<CaptionSegment>, options: SerializeOptions) -> Self {
        let mut store = Self {
            segments,
            options,
            text: String::new(),
        };
        store.reindex();
        store
    }

    pub fn segments(&self) -> &[CaptionSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Serialized view, always in step with `segments()`
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> SerializeOptions {
        self.options
    }

    /// Segment by 1-based index
    pub fn get(&self, index: usize) -> Result<&CaptionSegment, SubtitleError> {
        let position = self.position(index)?;
        Ok(&self.segments[position])
    }

    /// Insert a default segment right after `index`, starting at its end.
    ///
    /// Returns the index of the new segment.
    pub fn insert_after(&mut self, index: usize) -> Result<usize, SubtitleError> {
        let position = self.position(index)?;
        let start = self.segments[position].end;
        self.segments.insert(position + 1, Self::default_segment(start));
        self.reindex();
        Ok(index + 1)
    }

    /// Append a default segment after the last one (or at zero)
    pub fn append_default(&mut self) -> usize {
        let start = self.segments.last().map(|s| s.end).unwrap_or(Timestamp::ZERO);
        self.segments.push(Self::default_segment(start));
        self.reindex();
        self.segments.len()
    }

    /// Remove a segment; later segments move up one index
    pub fn delete(&mut self, index: usize) -> Result<CaptionSegment, SubtitleError> {
        let position = self.position(index)?;
        let removed = self.segments.remove(position);
        self.reindex();
        Ok(removed)
    }

    /// Replace the primary text of a segment
    pub fn edit_text(&mut self, index: usize, text: &str) -> Result<(), SubtitleError> {
        let position = self.position(index)?;
        let cleaned = codec::clean_caption_text(text).ok_or(SubtitleError::EmptyText(index))?;
        self.segments[position].primary_text = cleaned;
        self.refresh();
        Ok(())
    }

    /// Replace or clear the translation of a segment
    pub fn edit_translation(&mut self, index: usize, text: Option<&str>) -> Result<(), SubtitleError> {
        let position = self.position(index)?;
        self.segments[position].secondary_text = text.and_then(codec::clean_caption_text);
        self.refresh();
        Ok(())
    }

    /// Set one bound of a segment from seconds or timestamp text.
    ///
    /// The interval is not checked here; see `issues`.
    pub fn edit_time(
        &mut self,
        index: usize,
        field: TimeField,
        value: impl Into<TimeInput>,
    ) -> Result<Timestamp, SubtitleError> {
        let position = self.position(index)?;
        let value = value.into().resolve()?;
        let segment = &mut self.segments[position];
        match field {
            TimeField::Start => segment.start = value,
            TimeField::End => segment.end = value,
        }
        self.refresh();
        Ok(value)
    }

    /// Join a segment with the one after it
    pub fn merge_with_next(&mut self, index: usize) -> Result<(), SubtitleError> {
        let position = self.position(index)?;
        if position + 1 >= self.segments.len() {
            return Err(SubtitleError::SegmentNotFound {
                index: index + 1,
                count: self.segments.len(),
            });
        }

        let next = self.segments.remove(position + 1);
        let current = &mut self.segments[position];
        current.end = current.end.max(next.end);
        current.primary_text = format!("{}\n{}", current.primary_text, next.primary_text);
        current.secondary_text = match (current.secondary_text.take(), next.secondary_text) {
            (Some(a), Some(b)) => Some(format!("{}\n{}", a, b)),
            (a, b) => a.or(b),
        };

        self.reindex();
        Ok(())
    }

    /// Replace the whole document from edited raw text.
    ///
    /// The text is validated first; on failure the store is unchanged.
    pub fn replace_from_text(&mut self, raw: &str) -> Result<(), SubtitleError> {
        let validated = codec::validate(raw)?;
        debug!("Replacing {} segments with {} from raw text", self.segments.len(), validated.count);
        self.segments = validated.segments;
        self.reindex();
        Ok(())
    }

    /// Interval errors and overlap warnings for the current order
    pub fn issues(&self) -> Vec<SegmentIssue> {
        let mut issues: Vec<SegmentIssue> = self
            .segments
            .iter()
            .filter(|s| !s.has_valid_interval())
            .map(|s| SegmentIssue::InvalidInterval { index: s.index })
            .collect();
        issues.extend(codec::find_overlaps(&self.segments).into_iter().map(SegmentIssue::Overlap));
        issues
    }

    /// Whether the current document would pass validation
    pub fn is_valid(&self) -> bool {
        !self.segments.is_empty() && self.issues().iter().all(|i| !i.is_error())
    }

    /// Give up the segments
    pub fn into_segments(self) -> Vec<CaptionSegment> {
        self.segments
    }

    fn position(&self, index: usize) -> Result<usize, SubtitleError> {
        if index == 0 || index > self.segments.len() {
            return Err(SubtitleError::SegmentNotFound {
                index,
                count: self.segments.len(),
            });
        }
        Ok(index - 1)
    }

    fn default_segment(start: Timestamp) -> CaptionSegment {
        CaptionSegment::new(0, start, start.saturating_add_millis(DEFAULT_SEGMENT_MS), DEFAULT_SEGMENT_TEXT)
    }

    fn reindex(&mut self) {
        for (i, segment) in self.segments.iter_mut().enumerate() {
            segment.index = i + 1;
        }
        self.refresh();
    }

    fn refresh(&mut self) {
        self.text = codec::serialize(&self.segments, &self.options);
    }
}
