/*!
 * The captioning pipeline state machine.
 *
 * An `Orchestrator` is a cheap, clonable handle on one session. Runs are
 * plain async methods: each one captures the session generation when it
 * starts and re-checks it after every collaborator call. `reset` and
 * `select_media` bump the generation, so a run that was overtaken finishes
 * with `RunOutcome::Discarded` and leaves the session untouched.
 *
 * The session lock is never held across an `.await`.
 */

use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

use super::compose::{captions_from_transcription, compose_document, translated_text, translation_failure_text};
use super::context::{Artifacts, PipelineConfig, PipelineContext};
use super::progress::{self, ProgressEvent, ProgressTracker};
use super::state::{PipelineState, PipelineStatus};
use crate::errors::{PipelineError, ProviderError};
use crate::providers::{AudioExtractor, MediaData, MediaLoader, MediaRef, Muxer, Transcriber, Translator};
use crate::subtitle::{CaptionSegment, SegmentStore, SerializeOptions, codec};

/// The external services a pipeline depends on
#[derive(Clone)]
pub struct Collaborators {
    pub loader: Arc<dyn MediaLoader>,
    pub extractor: Arc<dyn AudioExtractor>,
    pub transcriber: Arc<dyn Transcriber>,
    pub translator: Arc<dyn Translator>,
    pub muxer: Arc<dyn Muxer>,
}

impl Collaborators {
    /// Use one value for every role
    pub fn uniform<P>(provider: P) -> Self
    where
        P: MediaLoader + AudioExtractor + Transcriber + Translator + Muxer + 'static,
    {
        let provider = Arc::new(provider);
        Self {
            loader: provider.clone(),
            extractor: provider.clone(),
            transcriber: provider.clone(),
            translator: provider.clone(),
            muxer: provider,
        }
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators")
            .field("loader", &self.loader)
            .field("extractor", &self.extractor)
            .field("transcriber", &self.transcriber)
            .field("translator", &self.translator)
            .field("muxer", &self.muxer)
            .finish()
    }
}

/// How a run ended when it did not fail
#[derive(Debug)]
pub enum RunOutcome<T> {
    /// The run finished and owns its result
    Finished(T),
    /// The session was reset or given new media while the run was in flight
    Discarded,
}

impl<T> RunOutcome<T> {
    pub fn finished(self) -> Option<T> {
        match self {
            RunOutcome::Finished(value) => Some(value),
            RunOutcome::Discarded => None,
        }
    }

    pub fn is_discarded(&self) -> bool {
        matches!(self, RunOutcome::Discarded)
    }
}

// Why a run stopped early
enum Interrupt {
    Stale,
    Failed(PipelineError),
}

type Step<T> = Result<T, Interrupt>;

fn fatal(kind: fn(String) -> PipelineError) -> impl FnOnce(ProviderError) -> Interrupt {
    move |e| Interrupt::Failed(kind(e.to_string()))
}

#[derive(Debug, Default)]
struct Session {
    generation: u64,
    status: PipelineStatus,
    tracker: ProgressTracker,
    context: Option<PipelineContext>,
}

/// Drives media through transcription, translation, review and embedding
#[derive(Clone)]
pub struct Orchestrator {
    session: Arc<Mutex<Session>>,
    collaborators: Collaborators,
    events: Option<UnboundedSender<ProgressEvent>>,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("status", &self.status())
            .field("collaborators", &self.collaborators)
            .finish()
    }
}

impl Orchestrator {
    pub fn new(collaborators: Collaborators) -> Self {
        Self {
            session: Arc::new(Mutex::new(Session::default())),
            collaborators,
            events: None,
        }
    }

    /// Send every status change to `sender`
    pub fn with_progress_channel(mut self, sender: UnboundedSender<ProgressEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Current status snapshot
    pub fn status(&self) -> PipelineStatus {
        self.session.lock().status.clone()
    }

    /// Current generation number
    pub fn generation(&self) -> u64 {
        self.session.lock().generation
    }

    /// Copy of the current context
    pub fn context(&self) -> Option<PipelineContext> {
        self.session.lock().context.clone()
    }

    /// Produced artifacts, if any
    pub fn artifacts(&self) -> Option<Artifacts> {
        self.session.lock().context.as_ref().map(|c| c.artifacts.clone())
    }

    /// Select media to caption. Replaces the whole context and abandons any
    /// run in flight.
    pub fn select_media(&self, media: MediaRef, config: PipelineConfig) {
        let mut session = self.session.lock();
        session.generation += 1;
        info!("Selected media: {}", media.name());
        session.context = Some(PipelineContext::new(media, config, session.generation));
        self.set_idle(&mut session);
    }

    /// Return to `Idle`, dropping the document and artifacts. The media
    /// selection and settings are kept.
    pub fn reset(&self) {
        let mut session = self.session.lock();
        session.generation += 1;
        let generation = session.generation;
        if let Some(context) = session.context.as_mut() {
            context.clear_outputs();
            context.generation = generation;
        }
        debug!("Pipeline reset (generation {})", generation);
        self.set_idle(&mut session);
    }

    /// Generate subtitles for the selected media.
    ///
    /// On success the pipeline waits in `AwaitingReview` and the returned
    /// store holds the document for editing.
    pub async fn generate(&self) -> Result<RunOutcome<SegmentStore>, PipelineError> {
        let (generation, media, config) = self.begin_run()?;
        let result = self.run_generation(generation, &media, &config).await;
        self.finish_run(generation, result)
    }

    /// Use an existing subtitle document for the selected media instead of
    /// generating one. Invalid text is rejected before anything changes.
    pub async fn import_subtitles(&self, text: &str) -> Result<RunOutcome<SegmentStore>, PipelineError> {
        let validated = codec::validate(text)?;
        let (generation, media, _config) = self.begin_run()?;
        let result = self.run_import(generation, &media, validated.segments).await;
        self.finish_run(generation, result)
    }

    /// Accept reviewed subtitles and embed them into the video
    pub async fn approve(&self, store: SegmentStore) -> Result<RunOutcome<Artifacts>, PipelineError> {
        let subtitles = store.text().to_string();
        codec::validate(&subtitles)?;

        let (generation, media, config, media_data) = {
            let mut session = self.session.lock();
            Self::require_review(&session)?;
            let generation = session.generation;
            let context = session.context.as_mut().ok_or(PipelineError::NoMedia)?;
            context.document = store.into_segments();
            let snapshot = (generation, context.media.clone(), context.config.clone(), context.media_data.clone());
            session.tracker.restart();
            self.transition(&mut session, PipelineState::EmbeddingVideo, progress::EMBED_START, None);
            snapshot
        };

        let result = self.run_embedding(generation, &media, &config, media_data, subtitles).await;
        self.finish_run(generation, result)
    }

    /// Accept reviewed subtitles as the final result without embedding
    pub fn finish_without_embedding(&self, store: SegmentStore) -> Result<Artifacts, PipelineError> {
        let subtitles = store.text().to_string();
        codec::validate(&subtitles)?;

        let mut session = self.session.lock();
        Self::require_review(&session)?;
        let context = session.context.as_mut().ok_or(PipelineError::NoMedia)?;
        context.document = store.into_segments();
        context.artifacts = Artifacts {
            subtitles: Some(subtitles),
            video: None,
        };
        let artifacts = context.artifacts.clone();
        session.tracker.restart();
        self.transition(&mut session, PipelineState::Completed, progress::REVIEW_READY, None);
        info!("Subtitles accepted without embedding");
        Ok(artifacts)
    }

    async fn run_generation(&self, generation: u64, media: &MediaRef, config: &PipelineConfig) -> Step<SegmentStore> {
        let data = self.load_media(generation, media).await?;

        self.enter(generation, PipelineState::ExtractingAudio, progress::EXTRACTION_START)?;
        let audio = self
            .collaborators
            .extractor
            .extract_audio(&data)
            .await
            .map_err(fatal(PipelineError::AudioExtraction))?;
        self.check(generation)?;

        self.enter(generation, PipelineState::Transcribing, progress::TRANSCRIPTION_START)?;
        let spans = {
            let audio = audio;
            let options = config.transcription_options();
            debug!("Transcribing {} bytes of audio (language: {:?})", audio.wav.len(), options.language);
            self.collaborators.transcriber.transcribe(&audio, &options).await
        };
        self.check(generation)?;
        let spans = spans.map_err(fatal(PipelineError::Transcription))?;
        let mut segments = captions_from_transcription(spans).map_err(Interrupt::Failed)?;
        info!("Transcribed {} segments", segments.len());
        self.update(generation, progress::TRANSCRIPTION_DONE, |context| {
            context.document = segments.clone();
        })?;

        if config.translation_enabled() {
            self.enter(generation, PipelineState::Translating, progress::TRANSLATION_START)?;
            self.translate_all(generation, &mut segments, config).await?;
        } else {
            debug!("Target language is '{}', skipping translation", config.target_language);
        }

        self.enter(generation, PipelineState::Composing, progress::COMPOSING)?;
        let options = config.serialize_options();
        let text = compose_document(&segments, &options).map_err(Interrupt::Failed)?;

        self.enter_review(generation, segments, text, options)
    }

    async fn run_import(&self, generation: u64, media: &MediaRef, segments: Vec<CaptionSegment>) -> Step<SegmentStore> {
        self.load_media(generation, media).await?;
        let options = SerializeOptions::default();
        let text = codec::serialize(&segments, &options);
        info!("Imported {} subtitle segments", segments.len());
        self.enter_review(generation, segments, text, options)
    }

    async fn run_embedding(
        &self,
        generation: u64,
        media: &MediaRef,
        config: &PipelineConfig,
        media_data: Option<MediaData>,
        subtitles: String,
    ) -> Step<Artifacts> {
        self.collaborators
            .muxer
            .ensure_ready()
            .await
            .map_err(fatal(PipelineError::Muxing))?;
        self.check(generation)?;
        self.advance(generation, progress::EMBED_READY)?;

        let data = match media_data {
            Some(data) => data,
            None => {
                let data = self
                    .collaborators
                    .loader
                    .load(media)
                    .await
                    .map_err(fatal(PipelineError::MediaRead))?;
                self.check(generation)?;
                data
            }
        };

        self.advance(generation, progress::EMBED_MUXING)?;
        let video = self
            .collaborators
            .muxer
            .mux(&data, &subtitles, &config.style)
            .await
            .map_err(fatal(PipelineError::Muxing))?;
        self.check(generation)?;

        let artifacts = Artifacts {
            subtitles: Some(subtitles),
            video: Some(video),
        };
        let mut session = self.session.lock();
        if session.generation != generation {
            return Err(Interrupt::Stale);
        }
        if let Some(context) = session.context.as_mut() {
            context.artifacts = artifacts.clone();
        }
        self.transition(&mut session, PipelineState::Completed, progress::EMBED_DONE, None);
        info!("Embedded subtitles into {}", data.name);
        Ok(artifacts)
    }

    async fn load_media(&self, generation: u64, media: &MediaRef) -> Step<MediaData> {
        self.collaborators
            .extractor
            .ensure_ready()
            .await
            .map_err(fatal(PipelineError::MediaRead))?;
        self.check(generation)?;
        self.advance(generation, progress::COLLABORATORS_READY)?;

        let data = self
            .collaborators
            .loader
            .load(media)
            .await
            .map_err(fatal(PipelineError::MediaRead))?;
        self.check(generation)?;
        debug!("Loaded {} ({} bytes)", data.name, data.bytes.len());

        self.update(generation, progress::MEDIA_LOADED, |context| {
            context.media_data = Some(data.clone());
        })?;
        Ok(data)
    }

    async fn translate_all(&self, generation: u64, segments: &mut [CaptionSegment], config: &PipelineConfig) -> Step<()> {
        let total = segments.len();
        let mut failures = 0usize;

        for (i, segment) in segments.iter_mut().enumerate() {
            let result = self
                .collaborators
                .translator
                .translate(&segment.primary_text, &config.target_language, &config.translation_model)
                .await;
            self.check(generation)?;

            segment.secondary_text = Some(match translated_text(result) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Translation of segment {} failed: {}", segment.index, e);
                    failures += 1;
                    translation_failure_text(&e)
                }
            });
            self.advance(generation, progress::translation_progress(i, total))?;
        }

        if failures > 0 {
            warn!("{} of {} segments could not be translated", failures, total);
        }
        Ok(())
    }

    fn enter_review(
        &self,
        generation: u64,
        segments: Vec<CaptionSegment>,
        text: String,
        options: SerializeOptions,
    ) -> Step<SegmentStore> {
        let mut session = self.session.lock();
        if session.generation != generation {
            return Err(Interrupt::Stale);
        }
        if let Some(context) = session.context.as_mut() {
            context.document = segments.clone();
            context.artifacts = Artifacts {
                subtitles: Some(text),
                video: None,
            };
        }
        self.transition(&mut session, PipelineState::AwaitingReview, progress::REVIEW_READY, None);
        Ok(SegmentStore::new(segments, options))
    }

    // Guard and move to LoadingMedia in one critical section
    fn begin_run(&self) -> Result<(u64, MediaRef, PipelineConfig), PipelineError> {
        let mut session = self.session.lock();
        let state = session.status.state;
        if !state.can_start_run() {
            return Err(PipelineError::Busy { state: state.to_string() });
        }

        let generation = session.generation;
        let context = session.context.as_mut().ok_or(PipelineError::NoMedia)?;
        context.clear_outputs();
        let snapshot = (generation, context.media.clone(), context.config.clone());

        session.tracker.restart();
        self.transition(&mut session, PipelineState::LoadingMedia, progress::LOADING_START, None);
        Ok(snapshot)
    }

    fn finish_run<T>(&self, generation: u64, result: Step<T>) -> Result<RunOutcome<T>, PipelineError> {
        match result {
            Ok(value) => Ok(RunOutcome::Finished(value)),
            Err(Interrupt::Stale) => {
                debug!("Discarding result of generation {}", generation);
                Ok(RunOutcome::Discarded)
            }
            Err(Interrupt::Failed(e)) => {
                let mut session = self.session.lock();
                if session.generation != generation {
                    debug!("Discarding failure of generation {}: {}", generation, e);
                    return Ok(RunOutcome::Discarded);
                }
                error!("{}", e);
                self.transition(&mut session, PipelineState::Failed, 0, Some(e.to_string()));
                Err(e)
            }
        }
    }

    fn require_review(session: &Session) -> Result<(), PipelineError> {
        let state = session.status.state;
        if state.is_working() {
            return Err(PipelineError::Busy { state: state.to_string() });
        }
        if state != PipelineState::AwaitingReview {
            return Err(PipelineError::NotAwaitingReview { state: state.to_string() });
        }
        Ok(())
    }

    fn check(&self, generation: u64) -> Step<()> {
        if self.session.lock().generation == generation {
            Ok(())
        } else {
            Err(Interrupt::Stale)
        }
    }

    fn enter(&self, generation: u64, state: PipelineState, value: u8) -> Step<()> {
        let mut session = self.session.lock();
        if session.generation != generation {
            return Err(Interrupt::Stale);
        }
        self.transition(&mut session, state, value, None);
        Ok(())
    }

    fn advance(&self, generation: u64, value: u8) -> Step<()> {
        self.update(generation, value, |_| {})
    }

    fn update(&self, generation: u64, value: u8, apply: impl FnOnce(&mut PipelineContext)) -> Step<()> {
        let mut session = self.session.lock();
        if session.generation != generation {
            return Err(Interrupt::Stale);
        }
        if let Some(context) = session.context.as_mut() {
            apply(context);
        }
        let state = session.status.state;
        self.transition(&mut session, state, value, None);
        Ok(())
    }

    fn set_idle(&self, session: &mut Session) {
        session.tracker.restart();
        self.transition(session, PipelineState::Idle, 0, None);
    }

    fn transition(&self, session: &mut Session, state: PipelineState, value: u8, error: Option<String>) {
        let previous = session.status.state;
        if previous != state && !previous.can_transition_to(state) {
            warn!("Unexpected pipeline transition {} -> {}", previous, state);
        }

        let progress = if state == PipelineState::Failed {
            session.tracker.restart();
            0
        } else {
            session.tracker.advance(value)
        };

        session.status = PipelineStatus {
            state,
            progress,
            step_label: state.label().to_string(),
            last_error: error.clone(),
        };

        if let Some(events) = &self.events {
            let _ = events.send(ProgressEvent {
                generation: session.generation,
                state,
                progress,
                label: session.status.step_label.clone(),
                error,
            });
        }
    }
}
