/*!
 * Controller commands driving mock collaborators and writing real files
 */

use autocaption::app_config::Config;
use autocaption::app_controller::{Controller, GenerateOptions, ReviewMode};
use autocaption::file_utils::FileManager;
use autocaption::pipeline::Collaborators;
use autocaption::providers::mock::{MockBehavior, MockCall, MockProvider};
use autocaption::subtitle::codec::Script;
use std::fs;
use std::path::Path;

use crate::common;

fn test_config() -> Config {
    let mut config = Config::default();
    config.provider.api_key = "sk-test".to_string();
    config
}

fn controller_with(mock: &MockProvider, config: Config) -> Controller {
    Controller::with_collaborators(config, Collaborators::uniform(mock.clone())).without_progress()
}

fn options(output_dir: &Path, embed: bool) -> GenerateOptions {
    GenerateOptions {
        output_dir: output_dir.to_path_buf(),
        review: ReviewMode::Skip,
        embed,
        force_overwrite: false,
    }
}

#[tokio::test]
async fn test_generate_shouldWriteSubtitlesAndVideo() {
    let dir = common::create_temp_dir().unwrap();
    let video = common::create_test_file(dir.path(), "talk.mp4", "video").unwrap();
    let mock = MockProvider::working();
    let controller = controller_with(&mock, test_config());

    let report = controller.generate(&video, &options(dir.path(), true)).await.unwrap().unwrap();

    assert_eq!(report.segment_count, 3);
    assert_eq!(report.subtitle_path, dir.path().join("talk_subtitles.srt"));
    let subtitles = fs::read_to_string(&report.subtitle_path).unwrap();
    assert!(subtitles.contains("Hello there\n[zh] Hello there\n"));

    let video_path = report.video_path.unwrap();
    assert_eq!(video_path, dir.path().join("talk_with_subtitles.mp4"));
    let embedded = fs::read(&video_path).unwrap();
    assert!(embedded.starts_with(b"mock video"));
    assert!(embedded.ends_with(subtitles.as_bytes()));
}

#[tokio::test]
async fn test_generate_withNoEmbed_shouldOnlyWriteSubtitles() {
    let dir = common::create_temp_dir().unwrap();
    let video = common::create_test_file(dir.path(), "talk.mp4", "video").unwrap();
    let mock = MockProvider::working();
    let controller = controller_with(&mock, test_config());

    let report = controller.generate(&video, &options(dir.path(), false)).await.unwrap().unwrap();

    assert!(report.video_path.is_none());
    assert!(report.subtitle_path.exists());
    assert!(!FileManager::video_output_path(&video, dir.path()).exists());
    assert_eq!(mock.calls(MockCall::Mux), 0);
}

#[tokio::test]
async fn test_generate_withExistingOutput_shouldSkipUnlessForced() {
    let dir = common::create_temp_dir().unwrap();
    let video = common::create_test_file(dir.path(), "talk.mp4", "video").unwrap();
    common::create_test_file(dir.path(), "talk_subtitles.srt", "old").unwrap();
    let mock = MockProvider::working();
    let controller = controller_with(&mock, test_config());

    assert!(controller.generate(&video, &options(dir.path(), false)).await.unwrap().is_none());
    assert_eq!(mock.calls(MockCall::Transcribe), 0);

    let forced = GenerateOptions {
        force_overwrite: true,
        ..options(dir.path(), false)
    };
    assert!(controller.generate(&video, &forced).await.unwrap().is_some());
    assert_ne!(fs::read_to_string(dir.path().join("talk_subtitles.srt")).unwrap(), "old");
}

#[tokio::test]
async fn test_generate_withoutApiKey_shouldFailBeforeRunning() {
    let dir = common::create_temp_dir().unwrap();
    let video = common::create_test_file(dir.path(), "talk.mp4", "video").unwrap();
    let mock = MockProvider::working();
    let controller = controller_with(&mock, Config::default());

    assert!(controller.generate(&video, &options(dir.path(), true)).await.is_err());
    assert_eq!(mock.calls(MockCall::Load), 0);
}

#[tokio::test]
async fn test_generate_withMissingInput_shouldFail() {
    let dir = common::create_temp_dir().unwrap();
    let mock = MockProvider::working();
    let controller = controller_with(&mock, test_config());

    let result = controller.generate(&dir.path().join("missing.mp4"), &options(dir.path(), true)).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_generate_withFailingTranscription_shouldReturnError() {
    let dir = common::create_temp_dir().unwrap();
    let video = common::create_test_file(dir.path(), "talk.mp4", "video").unwrap();
    let mock = MockProvider::working().with_behavior(MockCall::Transcribe, MockBehavior::Failing);
    let controller = controller_with(&mock, test_config());

    let error = controller.generate(&video, &options(dir.path(), true)).await.unwrap_err();
    assert!(error.to_string().contains("Transcription failed"));
    assert!(!dir.path().join("talk_subtitles.srt").exists());
}

#[tokio::test]
async fn test_embed_shouldMuxExistingSubtitleFile() {
    let dir = common::create_temp_dir().unwrap();
    let video = common::create_test_file(dir.path(), "talk.mp4", "video").unwrap();
    let srt = common::create_test_subtitle(dir.path(), "fixed.srt").unwrap();
    let out = dir.path().join("out");
    let mock = MockProvider::working();
    let controller = controller_with(&mock, test_config());

    let report = controller.embed(&video, &srt, &out).await.unwrap();

    assert_eq!(report.segment_count, 3);
    assert_eq!(mock.calls(MockCall::Transcribe), 0);
    assert_eq!(mock.muxed_subtitles(), vec![common::SAMPLE_SRT.to_string() + "\n"]);
    assert!(report.video_path.unwrap().starts_with(&out));
    assert!(out.join("talk_subtitles.srt").exists());
}

#[tokio::test]
async fn test_embed_withInvalidSubtitles_shouldFail() {
    let dir = common::create_temp_dir().unwrap();
    let video = common::create_test_file(dir.path(), "talk.mp4", "video").unwrap();
    let srt = common::create_test_file(dir.path(), "broken.srt", "hello\nworld\nno timing").unwrap();
    let mock = MockProvider::working();
    let controller = controller_with(&mock, test_config());

    assert!(controller.embed(&video, &srt, dir.path()).await.is_err());
    assert_eq!(mock.calls(MockCall::Mux), 0);
}

#[test]
fn test_inspect_shouldSummarizeFile() {
    let dir = common::create_temp_dir().unwrap();
    let srt = common::create_test_subtitle(dir.path(), "talk.srt").unwrap();
    let controller = controller_with(&MockProvider::working(), test_config());

    let info = controller.inspect(&srt).unwrap();
    assert_eq!(info.segment_count, 3);
    assert_eq!(info.formatted_duration, "00:00:14,000");
    assert_eq!(info.average_segment_ms, 3_666);
    assert_eq!(info.scripts, vec![Script::Latin]);

    let broken = common::create_test_file(dir.path(), "broken.srt", "").unwrap();
    assert!(controller.inspect(&broken).is_err());
}
