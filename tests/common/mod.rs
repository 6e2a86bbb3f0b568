/*!
 * Common test utilities for the autocaption test suite
 */

use anyhow::Result;
use autocaption::pipeline::{Collaborators, Orchestrator, PipelineConfig, ProgressEvent};
use autocaption::providers::MediaRef;
use autocaption::providers::mock::MockProvider;
use bytes::Bytes;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

/// Three well-formed segments with a gap before the last one
pub const SAMPLE_SRT: &str = "1
00:00:01,000 --> 00:00:04,000
This is a test subtitle.

2
00:00:05,000 --> 00:00:09,000
It contains multiple entries.

3
00:00:10,000 --> 00:00:14,000
For testing purposes.
";

/// Route library logs through the test harness; safe to call repeatedly
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates a sample subtitle file for testing
pub fn create_test_subtitle(dir: &Path, filename: &str) -> Result<PathBuf> {
    create_test_file(dir, filename, SAMPLE_SRT)
}

/// In-memory media used by orchestrator tests
pub fn sample_media() -> MediaRef {
    MediaRef::Memory {
        name: "clip.mp4".to_string(),
        bytes: Bytes::from_static(b"fake video bytes"),
    }
}

/// Pipeline settings translating into Chinese
pub fn chinese_config() -> PipelineConfig {
    PipelineConfig {
        target_language: "zh".to_string(),
        bilingual: true,
        ..PipelineConfig::default()
    }
}

/// Orchestrator backed by `mock`, with media already selected
pub fn orchestrator_with(mock: &MockProvider, config: PipelineConfig) -> Orchestrator {
    init_test_logging();
    let orchestrator = Orchestrator::new(Collaborators::uniform(mock.clone()));
    orchestrator.select_media(sample_media(), config);
    orchestrator
}

/// Same as `orchestrator_with` but also returns the progress receiver
pub fn observed_orchestrator(
    mock: &MockProvider,
    config: PipelineConfig,
) -> (Orchestrator, UnboundedReceiver<ProgressEvent>) {
    init_test_logging();
    let (sender, receiver) = unbounded_channel();
    let orchestrator = Orchestrator::new(Collaborators::uniform(mock.clone())).with_progress_channel(sender);
    orchestrator.select_media(sample_media(), config);
    (orchestrator, receiver)
}

/// Everything sent on a progress channel so far
pub fn drain_events(receiver: &mut UnboundedReceiver<ProgressEvent>) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}
