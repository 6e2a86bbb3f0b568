/*!
 * Millisecond timestamps and their `HH:MM:SS,mmm` text form.
 */

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::SubtitleError;

// @const: Exact timestamp grammar (hours may grow past two digits)
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2,}):(\d{2}):(\d{2}),(\d{3})$").unwrap()
});

const MS_PER_SECOND: u64 = 1_000;
const MS_PER_MINUTE: u64 = 60_000;
const MS_PER_HOUR: u64 = 3_600_000;

/// A non-negative point in time, exact to the millisecond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Zero
    pub const ZERO: Timestamp = Timestamp(0);

    pub const fn from_millis(ms: u64) -> Self {
        Timestamp(ms)
    }

    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Convert fractional seconds, rounding to the nearest millisecond.
    ///
    /// Returns `None` for negative or non-finite input.
    pub fn from_secs_f64(seconds: f64) -> Option<Self> {
        if !seconds.is_finite() || seconds < 0.0 {
            return None;
        }
        Some(Timestamp((seconds * 1000.0).round() as u64))
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1000.0
    }

    /// Timestamp shifted forward, saturating at `u64::MAX`
    pub fn saturating_add_millis(self, ms: u64) -> Self {
        Timestamp(self.0.saturating_add(ms))
    }

    /// Milliseconds from `earlier` to `self`, or `None` if `earlier` is later
    pub fn millis_since(self, earlier: Timestamp) -> Option<u64> {
        self.0.checked_sub(earlier.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_timestamp(self.0))
    }
}

impl FromStr for Timestamp {
    type Err = SubtitleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_timestamp(s).map(Timestamp)
    }
}

/// Format milliseconds as `HH:MM:SS,mmm`. Hours are not wrapped at 24.
pub fn format_timestamp(ms: u64) -> String {
    let hours = ms / MS_PER_HOUR;
    let minutes = (ms % MS_PER_HOUR) / MS_PER_MINUTE;
    let seconds = (ms % MS_PER_MINUTE) / MS_PER_SECOND;
    let millis = ms % MS_PER_SECOND;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

/// Parse `HH:MM:SS,mmm` into milliseconds.
pub fn parse_timestamp(text: &str) -> Result<u64, SubtitleError> {
    let malformed = || SubtitleError::MalformedTimestamp(text.to_string());

    let caps = TIMESTAMP_REGEX.captures(text).ok_or_else(malformed)?;
    let field = |i: usize| -> Result<u64, SubtitleError> {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .ok_or_else(malformed)
    };

    let hours = field(1)?;
    let minutes = field(2)?;
    let seconds = field(3)?;
    let millis = field(4)?;

    if minutes >= 60 || seconds >= 60 {
        return Err(malformed());
    }

    hours
        .checked_mul(MS_PER_HOUR)
        .and_then(|h| h.checked_add(minutes * MS_PER_MINUTE + seconds * MS_PER_SECOND + millis))
        .ok_or_else(malformed)
}
