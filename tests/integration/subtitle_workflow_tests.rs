/*!
 * Review workflows: editing generated subtitles before accepting them
 */

use autocaption::errors::PipelineError;
use autocaption::pipeline::PipelineState;
use autocaption::providers::mock::{MockCall, MockProvider};
use autocaption::subtitle::{TimeField, codec};

use crate::common;

#[tokio::test]
async fn test_review_structuralEdits_shouldReachEmbeddedText() {
    let mock = MockProvider::working();
    let orchestrator = common::orchestrator_with(&mock, common::chinese_config());
    let mut store = orchestrator.generate().await.unwrap().finished().unwrap();

    store.merge_with_next(1).unwrap();
    let added = store.insert_after(2).unwrap();
    store.edit_time(added, TimeField::End, "00:00:09,000").unwrap();
    store.edit_text(added, "Thanks for watching").unwrap();
    store.edit_translation(added, Some("感谢观看")).unwrap();

    assert_eq!(store.len(), 3);
    let expected = store.text().to_string();
    assert!(expected.contains("Hello there\nHow are you\n[zh] Hello there\n[zh] How are you\n"));
    assert!(expected.contains("3\n00:00:05,000 --> 00:00:09,000\nThanks for watching\n感谢观看\n"));

    let artifacts = orchestrator.approve(store).await.unwrap().finished().unwrap();
    assert_eq!(artifacts.subtitles.as_deref(), Some(expected.as_str()));
    assert_eq!(mock.muxed_subtitles(), vec![expected]);
    assert_eq!(orchestrator.context().unwrap().document.len(), 3);
}

#[tokio::test]
async fn test_review_replaceFromEditedFile_shouldKeepBilingualLines() {
    let mock = MockProvider::working();
    let orchestrator = common::orchestrator_with(&mock, common::chinese_config());
    let mut store = orchestrator.generate().await.unwrap().finished().unwrap();

    let edited = store.text().replace("[zh] Goodbye", "再见");
    store.replace_from_text(&edited).unwrap();
    assert_eq!(store.text(), edited);
    assert_eq!(store.get(3).unwrap().primary_text, "Goodbye\n再见");

    let artifacts = orchestrator.finish_without_embedding(store).unwrap();
    assert_eq!(artifacts.subtitles.as_deref(), Some(edited.as_str()));
    assert_eq!(orchestrator.status().state, PipelineState::Completed);
    assert_eq!(mock.calls(MockCall::Mux), 0);
}

#[tokio::test]
async fn test_review_deletingEverything_shouldBeRejectedOnApprove() {
    let mock = MockProvider::working();
    let orchestrator = common::orchestrator_with(&mock, common::chinese_config());
    let mut store = orchestrator.generate().await.unwrap().finished().unwrap();

    while !store.is_empty() {
        store.delete(1).unwrap();
    }
    assert!(!store.is_valid());
    assert!(matches!(orchestrator.approve(store).await, Err(PipelineError::Validation(_))));
    assert_eq!(orchestrator.status().state, PipelineState::AwaitingReview);
}

#[tokio::test]
async fn test_finishWithoutEmbedding_twice_shouldRequireReview() {
    let mock = MockProvider::working();
    let orchestrator = common::orchestrator_with(&mock, common::chinese_config());
    let store = orchestrator.generate().await.unwrap().finished().unwrap();
    let copy = store.clone();

    orchestrator.finish_without_embedding(store).unwrap();
    let error = orchestrator.finish_without_embedding(copy).unwrap_err();
    assert!(matches!(error, PipelineError::NotAwaitingReview { ref state } if state == "Completed"));
}

#[tokio::test]
async fn test_regenerate_afterCompletion_shouldStartFresh() {
    let mock = MockProvider::working();
    let orchestrator = common::orchestrator_with(&mock, common::chinese_config());
    let store = orchestrator.generate().await.unwrap().finished().unwrap();
    orchestrator.approve(store).await.unwrap();
    assert!(orchestrator.artifacts().unwrap().video.is_some());

    let store = orchestrator.generate().await.unwrap().finished().unwrap();
    assert!(codec::validate(store.text()).is_ok());
    assert!(orchestrator.artifacts().unwrap().video.is_none());
    assert_eq!(mock.calls(MockCall::Transcribe), 2);
}
