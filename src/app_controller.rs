use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::app_config::Config;
use crate::file_utils::{FileManager, FsMediaLoader};
use crate::pipeline::{Artifacts, Collaborators, Orchestrator, PipelineConfig, PipelineState, ProgressEvent, RunOutcome};
use crate::providers::MediaRef;
use crate::providers::ffmpeg::Ffmpeg;
use crate::providers::openai::{ModelCatalog, OpenAI};
use crate::subtitle::{DocumentInfo, SegmentIssue, SegmentStore};

// @module: Application controller for subtitle generation

/// What to do between generation and embedding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewMode {
    /// Accept the generated subtitles as they are
    Skip,
    /// Write the subtitles, wait for the user to edit them, then reload
    Interactive,
}

/// Options for one `generate` call
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub output_dir: PathBuf,
    pub review: ReviewMode,
    pub embed: bool,
    pub force_overwrite: bool,
}

/// Files written by a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputReport {
    pub subtitle_path: PathBuf,
    pub video_path: Option<PathBuf>,
    pub segment_count: usize,
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Services used by the pipeline
    collaborators: Collaborators,
    // @field: Render progress bars
    show_progress: bool,
}

impl Controller {
    // @method: Create a controller with the default collaborators
    pub fn with_config(config: Config) -> Result<Self> {
        let client = OpenAI::from_config(&config.provider).context("Failed to create OpenAI client")?;
        let ffmpeg = Arc::new(Ffmpeg::default());
        let client = Arc::new(client);

        let collaborators = Collaborators {
            loader: Arc::new(FsMediaLoader),
            extractor: ffmpeg.clone(),
            transcriber: client.clone(),
            translator: client,
            muxer: ffmpeg,
        };
        Ok(Self::with_collaborators(config, collaborators))
    }

    // @method: Create a controller around custom collaborators
    pub fn with_collaborators(config: Config, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
            show_progress: true,
        }
    }

    /// Disable progress bars (tests, non-interactive use)
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Generate subtitles for a video and optionally embed them
    pub async fn generate(&self, input_file: &Path, options: &GenerateOptions) -> Result<Option<OutputReport>> {
        let start_time = Instant::now();
        if !FileManager::file_exists(input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }
        self.config.validate_for_generation().context("Configuration validation failed")?;

        let subtitle_path = FileManager::subtitle_output_path(input_file, &options.output_dir);
        if subtitle_path.exists() && !options.force_overwrite {
            warn!("Skipping file, subtitles already exist at {:?} (use -f to force overwrite)", subtitle_path);
            return Ok(None);
        }

        let (orchestrator, renderer) = self.start_orchestrator();
        orchestrator.select_media(MediaRef::Path(input_file.to_path_buf()), PipelineConfig::from(&self.config));

        let result = self.generate_with(&orchestrator, input_file, &subtitle_path, options).await;
        Self::stop_renderer(orchestrator, renderer).await;

        if let Ok(Some(report)) = &result {
            info!(
                "Finished {} segments in {}.",
                report.segment_count,
                Self::format_duration(start_time.elapsed())
            );
        }
        result
    }

    async fn generate_with(
        &self,
        orchestrator: &Orchestrator,
        input_file: &Path,
        subtitle_path: &Path,
        options: &GenerateOptions,
    ) -> Result<Option<OutputReport>> {
        let mut store = match orchestrator.generate().await? {
            RunOutcome::Finished(store) => store,
            RunOutcome::Discarded => return Ok(None),
        };

        FileManager::write_to_file(subtitle_path, store.text())?;
        info!("Subtitles written to {:?}", subtitle_path);

        if options.review == ReviewMode::Interactive {
            Self::review_interactively(&mut store, subtitle_path).await?;
        }
        Self::log_issues(&store);

        let segment_count = store.len();
        let artifacts = if options.embed {
            match orchestrator.approve(store).await? {
                RunOutcome::Finished(artifacts) => artifacts,
                RunOutcome::Discarded => return Ok(None),
            }
        } else {
            orchestrator.finish_without_embedding(store)?
        };

        self.write_artifacts(input_file, &options.output_dir, &artifacts, segment_count)
            .map(Some)
    }

    /// Embed an existing subtitle file into a video
    pub async fn embed(&self, video: &Path, subtitles: &Path, output_dir: &Path) -> Result<OutputReport> {
        let text = FileManager::read_to_string(subtitles)?;
        let (orchestrator, renderer) = self.start_orchestrator();
        orchestrator.select_media(MediaRef::Path(video.to_path_buf()), PipelineConfig::from(&self.config));

        let result = async {
            let store = orchestrator
                .import_subtitles(&text)
                .await
                .context(format!("Failed to import subtitles from {:?}", subtitles))?
                .finished()
                .ok_or_else(|| anyhow!("Import was interrupted"))?;
            Self::log_issues(&store);
            let segment_count = store.len();
            let artifacts = orchestrator
                .approve(store)
                .await?
                .finished()
                .ok_or_else(|| anyhow!("Embedding was interrupted"))?;
            self.write_artifacts(video, output_dir, &artifacts, segment_count)
        }
        .await;

        Self::stop_renderer(orchestrator, renderer).await;
        result
    }

    /// Summarize a subtitle file
    pub fn inspect(&self, subtitles: &Path) -> Result<DocumentInfo> {
        let text = FileManager::read_to_string(subtitles)?;
        let document = crate::subtitle::codec::validate(&text).context(format!("Invalid subtitle file {:?}", subtitles))?;
        for warning in &document.warnings {
            warn!("{}", warning);
        }
        Ok(DocumentInfo::from_validated(&document))
    }

    /// Models available from the configured service
    pub async fn list_models(&self) -> Result<ModelCatalog> {
        let client = OpenAI::from_config(&self.config.provider)?;
        match client.list_models().await {
            Ok(catalog) => Ok(catalog),
            Err(e) => {
                warn!("Failed to fetch models from API: {}", e);
                Ok(ModelCatalog::fallback())
            }
        }
    }

    fn write_artifacts(
        &self,
        input_file: &Path,
        output_dir: &Path,
        artifacts: &Artifacts,
        segment_count: usize,
    ) -> Result<OutputReport> {
        let subtitle_path = FileManager::subtitle_output_path(input_file, output_dir);
        let subtitles = artifacts
            .subtitles
            .as_deref()
            .ok_or_else(|| anyhow!("No subtitles were produced"))?;
        FileManager::write_to_file(&subtitle_path, subtitles)?;

        let video_path = match &artifacts.video {
            Some(video) => {
                let path = FileManager::video_output_path(input_file, output_dir);
                FileManager::write_bytes(&path, video)?;
                info!("Captioned video written to {:?}", path);
                Some(path)
            }
            None => None,
        };

        Ok(OutputReport {
            subtitle_path,
            video_path,
            segment_count,
        })
    }

    async fn review_interactively(store: &mut SegmentStore, subtitle_path: &Path) -> Result<()> {
        loop {
            info!("Edit {:?} and press Enter to continue", subtitle_path);
            tokio::task::spawn_blocking(|| {
                let mut line = String::new();
                std::io::stdin().lock().read_line(&mut line)
            })
            .await
            .context("Failed to wait for input")??;

            let edited = FileManager::read_to_string(subtitle_path)?;
            match store.replace_from_text(&edited) {
                Ok(()) => return Ok(()),
                Err(e) => error!("Edited subtitles are invalid: {}", e),
            }
        }
    }

    fn log_issues(store: &SegmentStore) {
        for issue in store.issues() {
            match issue {
                SegmentIssue::InvalidInterval { index } => warn!("Segment {} does not end after it starts", index),
                SegmentIssue::Overlap(overlap) => warn!("{}", overlap),
            }
        }
    }

    fn start_orchestrator(&self) -> (Orchestrator, Option<JoinHandle<()>>) {
        let orchestrator = Orchestrator::new(self.collaborators.clone());
        if !self.show_progress {
            return (orchestrator, None);
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        let renderer = tokio::spawn(Self::render_progress(receiver));
        (orchestrator.with_progress_channel(sender), Some(renderer))
    }

    async fn stop_renderer(orchestrator: Orchestrator, renderer: Option<JoinHandle<()>>) {
        drop(orchestrator);
        if let Some(renderer) = renderer {
            let _ = renderer.await;
        }
    }

    async fn render_progress(mut events: mpsc::UnboundedReceiver<ProgressEvent>) {
        let progress_bar = ProgressBar::new(100);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}% {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));

        while let Some(event) = events.recv().await {
            match event.state {
                PipelineState::Failed => {
                    progress_bar.abandon_with_message(event.error.unwrap_or_default());
                }
                PipelineState::AwaitingReview | PipelineState::Completed => {
                    progress_bar.set_position(event.progress as u64);
                    progress_bar.set_message(event.label);
                    progress_bar.finish();
                }
                _ => {
                    if progress_bar.is_finished() {
                        progress_bar.reset();
                    }
                    progress_bar.set_position(event.progress as u64);
                    progress_bar.set_message(event.label);
                }
            }
        }
    }

    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
