/*!
 * Tests for SRT timestamps
 */

use autocaption::errors::SubtitleError;
use autocaption::subtitle::{Timestamp, format_timestamp, parse_timestamp};

#[test]
fn test_formatThenParse_shouldPreserveMilliseconds() {
    for ms in [0, 1, 999, 1_000, 59_999, 3_599_999, 3_600_000, 86_400_123, 360_000_000] {
        assert_eq!(parse_timestamp(&format_timestamp(ms)).unwrap(), ms, "value {}", ms);
    }
}

#[test]
fn test_parse_withMinutesOrSecondsOutOfRange_shouldFail() {
    assert!(matches!(parse_timestamp("00:60:00,000"), Err(SubtitleError::MalformedTimestamp(_))));
    assert!(matches!(parse_timestamp("00:00:60,000"), Err(SubtitleError::MalformedTimestamp(_))));
}

#[test]
fn test_parse_withWrongShape_shouldFail() {
    for text in ["", "1:00:00,000", "00:00:00.000", "00:00:00,00", "00:00:00,0000", "aa:bb:cc,ddd", " 00:00:01,000"] {
        assert!(parse_timestamp(text).is_err(), "accepted {:?}", text);
    }
}

#[test]
fn test_parse_withLongHours_shouldAccept() {
    assert_eq!(parse_timestamp("100:00:00,000").unwrap(), 360_000_000);
}

#[test]
fn test_timestamp_fromSeconds_shouldRoundToNearestMillisecond() {
    assert_eq!(Timestamp::from_secs_f64(1.5).unwrap().as_millis(), 1_500);
    assert_eq!(Timestamp::from_secs_f64(0.0004).unwrap().as_millis(), 0);
    assert_eq!(Timestamp::from_secs_f64(0.0006).unwrap().as_millis(), 1);
    assert!(Timestamp::from_secs_f64(-0.5).is_none());
    assert!(Timestamp::from_secs_f64(f64::NAN).is_none());
}

#[test]
fn test_timestamp_displayAndFromStr_shouldAgree() {
    let ts: Timestamp = "01:02:03,004".parse().unwrap();
    assert_eq!(ts, Timestamp::from_millis(3_723_004));
    assert_eq!(ts.to_string(), "01:02:03,004");
}

#[test]
fn test_timestamp_millisSince_shouldRejectEarlierSelf() {
    let a = Timestamp::from_millis(1_000);
    let b = Timestamp::from_millis(1_500);
    assert_eq!(b.millis_since(a), Some(500));
    assert_eq!(a.millis_since(b), None);
}
