/*!
 * Tests for the editable segment store
 */

use autocaption::errors::SubtitleError;
use autocaption::subtitle::codec;
use autocaption::subtitle::store::{DEFAULT_SEGMENT_MS, DEFAULT_SEGMENT_TEXT};
use autocaption::subtitle::{SegmentIssue, SegmentStore, SerializeOptions, TimeField, TimeInput, Timestamp};

use crate::common::SAMPLE_SRT;

fn sample_store() -> SegmentStore {
    SegmentStore::new(codec::parse(SAMPLE_SRT), SerializeOptions::default())
}

fn indices(store: &SegmentStore) -> Vec<usize> {
    store.segments().iter().map(|s| s.index).collect()
}

#[test]
fn test_new_shouldMirrorSerializedText() {
    let store = sample_store();
    assert_eq!(store.len(), 3);
    assert_eq!(store.text(), codec::serialize(store.segments(), &SerializeOptions::default()));
}

#[test]
fn test_insertAfter_shouldStartAtPreviousEnd() {
    let mut store = sample_store();
    let index = store.insert_after(1).unwrap();
    assert_eq!(index, 2);

    let inserted = store.get(2).unwrap();
    assert_eq!(inserted.start, Timestamp::from_millis(4_000));
    assert_eq!(inserted.end, Timestamp::from_millis(4_000 + DEFAULT_SEGMENT_MS));
    assert_eq!(inserted.primary_text, DEFAULT_SEGMENT_TEXT);
    assert_eq!(indices(&store), vec![1, 2, 3, 4]);
    assert!(store.text().contains(DEFAULT_SEGMENT_TEXT));
}

#[test]
fn test_insertAfter_overlappingNeighbour_shouldBeWarningOnly() {
    let mut store = sample_store();
    store.insert_after(1).unwrap();
    let issues = store.issues();
    assert_eq!(issues.len(), 1);
    assert!(matches!(&issues[0], SegmentIssue::Overlap(o) if o.index == 3 && o.overlap_ms == 2_000));
    assert!(store.is_valid());
}

#[test]
fn test_appendDefault_onEmptyStore_shouldStartAtZero() {
    let mut store = SegmentStore::new(Vec::new(), SerializeOptions::default());
    assert!(!store.is_valid());
    assert_eq!(store.append_default(), 1);
    assert_eq!(store.get(1).unwrap().start, Timestamp::ZERO);
    assert!(store.is_valid());
}

#[test]
fn test_delete_shouldRenumberFollowers() {
    let mut store = sample_store();
    let removed = store.delete(2).unwrap();
    assert_eq!(removed.primary_text, "It contains multiple entries.");
    assert_eq!(indices(&store), vec![1, 2]);
    assert_eq!(store.get(2).unwrap().primary_text, "For testing purposes.");
    assert!(!store.text().contains("multiple entries"));
}

#[test]
fn test_outOfRangeIndex_shouldReportCount() {
    let mut store = sample_store();
    assert!(matches!(store.delete(0), Err(SubtitleError::SegmentNotFound { index: 0, count: 3 })));
    assert!(matches!(store.edit_text(4, "x"), Err(SubtitleError::SegmentNotFound { index: 4, count: 3 })));
    assert!(matches!(store.merge_with_next(3), Err(SubtitleError::SegmentNotFound { .. })));
}

#[test]
fn test_editText_shouldRejectBlankAndDropEmptyLines() {
    let mut store = sample_store();
    assert!(matches!(store.edit_text(1, "  \n "), Err(SubtitleError::EmptyText(1))));

    store.edit_text(1, "First line\n\nSecond line  \n").unwrap();
    assert_eq!(store.get(1).unwrap().primary_text, "First line\nSecond line");
    assert!(store.text().contains("First line\nSecond line\n"));
}

#[test]
fn test_editTranslation_shouldAffectBilingualText() {
    let mut store = SegmentStore::new(codec::parse(SAMPLE_SRT), SerializeOptions::bilingual());
    store.edit_translation(1, Some("这是一个测试字幕。")).unwrap();
    assert!(store.text().contains("This is a test subtitle.\n这是一个测试字幕。\n"));

    store.edit_translation(1, None).unwrap();
    assert!(!store.text().contains("这是"));
}

#[test]
fn test_editTime_shouldAcceptSecondsOrTimestampText() {
    let mut store = sample_store();
    let start = store.edit_time(2, TimeField::Start, 4.5).unwrap();
    assert_eq!(start, Timestamp::from_millis(4_500));

    let end = store.edit_time(2, TimeField::End, "00:00:09,250").unwrap();
    assert_eq!(end, Timestamp::from_millis(9_250));

    let end = store.edit_time(2, TimeField::End, TimeInput::Text("9.75".to_string())).unwrap();
    assert_eq!(end, Timestamp::from_millis(9_750));
    assert!(store.text().contains("00:00:04,500 --> 00:00:09,750"));
}

#[test]
fn test_editTime_withBadInput_shouldLeaveStoreUnchanged() {
    let mut store = sample_store();
    let before = store.text().to_string();
    assert!(store.edit_time(1, TimeField::Start, "00:61:00,000").is_err());
    assert!(store.edit_time(1, TimeField::Start, -2.0).is_err());
    assert!(store.edit_time(1, TimeField::Start, "soon").is_err());
    assert_eq!(store.text(), before);
}

#[test]
fn test_editTime_endBeforeStart_shouldBeReportedAsError() {
    let mut store = sample_store();
    store.edit_time(1, TimeField::End, 0.5).unwrap();
    assert_eq!(store.issues(), vec![SegmentIssue::InvalidInterval { index: 1 }]);
    assert!(!store.is_valid());
    assert!(codec::validate(store.text()).is_err());
}

#[test]
fn test_mergeWithNext_shouldJoinTextAndSpan() {
    let mut store = sample_store();
    store.merge_with_next(1).unwrap();
    assert_eq!(store.len(), 2);
    let merged = store.get(1).unwrap();
    assert_eq!(merged.start, Timestamp::from_millis(1_000));
    assert_eq!(merged.end, Timestamp::from_millis(9_000));
    assert_eq!(merged.primary_text, "This is a test subtitle.\nIt contains multiple entries.");
    assert_eq!(indices(&store), vec![1, 2]);
}

#[test]
fn test_replaceFromText_shouldValidateFirst() {
    let mut store = sample_store();
    let before = store.text().to_string();
    assert!(store.replace_from_text("garbage").is_err());
    assert_eq!(store.text(), before);

    store
        .replace_from_text("4\n00:00:02,000 --> 00:00:03,000\nReplaced\n")
        .unwrap();
    assert_eq!(store.len(), 1);
    assert_eq!(indices(&store), vec![1]);
    assert_eq!(store.text(), "1\n00:00:02,000 --> 00:00:03,000\nReplaced\n\n");
}

#[test]
fn test_storeText_shouldAlwaysValidateAfterWellFormedEdits() {
    let mut store = sample_store();
    store.insert_after(3).unwrap();
    store.edit_text(4, "Closing line").unwrap();
    store.delete(1).unwrap();
    store.merge_with_next(1).unwrap();

    let document = codec::validate(store.text()).unwrap();
    assert_eq!(document.count, store.len());
    assert_eq!(document.segments, store.segments().to_vec());
}
