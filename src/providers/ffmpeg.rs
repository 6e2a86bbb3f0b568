/*!
 * Audio extraction and subtitle embedding through the `ffmpeg` binary.
 *
 * Every call works in its own temporary directory, which is removed when
 * the call returns.
 */

use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, error, warn};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Command;
use tokio::sync::OnceCell;

use crate::app_config::SubtitleStyle;
use crate::errors::ProviderError;
use crate::providers::{AudioExtractor, AudioTrack, MediaData, Muxer};

const INPUT_NAME: &str = "input.mp4";
const AUDIO_NAME: &str = "audio.wav";
const SUBTITLE_NAME: &str = "subtitles.srt";
const OUTPUT_NAME: &str = "output.mp4";

/// Driver for a local `ffmpeg` executable
#[derive(Debug)]
pub struct Ffmpeg {
    // @field: Executable name or path
    binary: String,
    // @field: Limit for a single ffmpeg run
    timeout: Duration,
    // @field: Set once `ffmpeg -version` succeeded
    ready: OnceCell<()>,
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::new("ffmpeg", Duration::from_secs(600))
    }
}

impl Ffmpeg {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
            ready: OnceCell::new(),
        }
    }

    async fn check_binary(&self) -> Result<(), ProviderError> {
        let output = Command::new(&self.binary)
            .arg("-version")
            .output()
            .await
            .map_err(|e| ProviderError::ToolUnavailable(format!("Failed to start {}: {}", self.binary, e)))?;

        if !output.status.success() {
            return Err(ProviderError::ToolUnavailable(format!("{} -version exited with {}", self.binary, output.status)));
        }

        let banner = String::from_utf8_lossy(&output.stdout);
        debug!("Using {}", banner.lines().next().unwrap_or("ffmpeg"));
        Ok(())
    }

    async fn run(&self, workdir: &Path, args: &[String]) -> Result<(), ProviderError> {
        debug!("Running {} {}", self.binary, args.join(" "));
        let ffmpeg_future = Command::new(&self.binary)
            .current_dir(workdir)
            .arg("-y")
            .args(args)
            .output();

        let result = tokio::select! {
            result = ffmpeg_future => {
                result.map_err(|e| ProviderError::ToolUnavailable(format!("Failed to execute ffmpeg: {}", e)))?
            },
            _ = tokio::time::sleep(self.timeout) => {
                return Err(ProviderError::ToolFailed(format!("ffmpeg timed out after {} seconds", self.timeout.as_secs())));
            }
        };

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let filtered = filter_ffmpeg_stderr(&stderr);
            error!("ffmpeg failed: {}", filtered);
            return Err(ProviderError::ToolFailed(filtered));
        }
        Ok(())
    }
}

#[async_trait]
impl AudioExtractor for Ffmpeg {
    async fn ensure_ready(&self) -> Result<(), ProviderError> {
        self.ready.get_or_try_init(|| self.check_binary()).await.map(|_| ())
    }

    async fn extract_audio(&self, media: &MediaData) -> Result<AudioTrack, ProviderError> {
        let workdir = TempDir::new()?;
        tokio::fs::write(workdir.path().join(INPUT_NAME), &media.bytes).await?;

        self.run(workdir.path(), &audio_extraction_args()).await?;

        let wav = tokio::fs::read(workdir.path().join(AUDIO_NAME)).await?;
        if wav.is_empty() {
            return Err(ProviderError::ToolFailed(format!("No audio produced for {}", media.name)));
        }
        Ok(AudioTrack {
            file_name: AUDIO_NAME.to_string(),
            wav: Bytes::from(wav),
        })
    }
}

#[async_trait]
impl Muxer for Ffmpeg {
    async fn ensure_ready(&self) -> Result<(), ProviderError> {
        self.ready.get_or_try_init(|| self.check_binary()).await.map(|_| ())
    }

    async fn mux(&self, media: &MediaData, subtitles: &str, style: &SubtitleStyle) -> Result<Bytes, ProviderError> {
        let workdir = TempDir::new()?;
        tokio::fs::write(workdir.path().join(INPUT_NAME), &media.bytes).await?;
        tokio::fs::write(workdir.path().join(SUBTITLE_NAME), subtitles).await?;

        self.run(workdir.path(), &mux_args(style)).await?;

        let video = tokio::fs::read(workdir.path().join(OUTPUT_NAME)).await?;
        Ok(Bytes::from(video))
    }
}

/// Arguments turning the input into 16 kHz mono 16-bit PCM WAV
pub fn audio_extraction_args() -> Vec<String> {
    ["-i", INPUT_NAME, "-vn", "-acodec", "pcm_s16le", "-ar", "16000", "-ac", "1", AUDIO_NAME]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Arguments that either burn the subtitles in or add them as a track
pub fn mux_args(style: &SubtitleStyle) -> Vec<String> {
    if style.hard_sub {
        let filter = format!("subtitles={}:force_style='{}'", SUBTITLE_NAME, force_style(style));
        vec![
            "-i".to_string(),
            INPUT_NAME.to_string(),
            "-vf".to_string(),
            filter,
            "-c:a".to_string(),
            "copy".to_string(),
            OUTPUT_NAME.to_string(),
        ]
    } else {
        [
            "-i", INPUT_NAME, "-i", SUBTITLE_NAME, "-c:v", "copy", "-c:a", "copy", "-c:s", "mov_text",
            "-metadata:s:s:0", "language=eng", OUTPUT_NAME,
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }
}

/// `force_style` value for the subtitles filter
pub fn force_style(style: &SubtitleStyle) -> String {
    format!(
        "FontSize={},PrimaryColour=&H{},OutlineColour=&H{},Outline={}",
        style.font_size,
        color_to_hex(&style.font_color),
        color_to_hex(&style.outline_color),
        style.outline_width
    )
}

/// Named color in the `BBGGRR` order ASS styles expect; unknown names are white
pub fn color_to_hex(color: &str) -> &'static str {
    match color.trim().to_lowercase().as_str() {
        "white" => "FFFFFF",
        "black" => "000000",
        "red" => "0000FF",
        "green" => "00FF00",
        "blue" => "FF0000",
        "yellow" => "00FFFF",
        "gray" | "grey" => "808080",
        other => {
            warn!("Unknown subtitle color '{}', using white", other);
            "FFFFFF"
        }
    }
}

/// Filter ffmpeg stderr to only show meaningful error lines, stripping the
/// version banner, build configuration, and stream metadata noise.
pub fn filter_ffmpeg_stderr(stderr: &str) -> String {
    let noise_prefixes = [
        "ffmpeg version",
        "built with",
        "configuration:",
        "lib",
        "Input #",
        "Metadata:",
        "Duration:",
        "Stream #",
        "Output #",
        "Stream mapping:",
        "Press [q]",
        "encoder",
        "major_brand",
        "minor_version",
        "compatible_brands",
        "handler_name",
        "vendor_id",
        "creation_time",
        "size=",
        "frame=",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !noise_prefixes.iter().any(|p| line.starts_with(p)))
        .collect();

    if meaningful.is_empty() {
        "unknown ffmpeg error (stderr was empty after filtering)".to_string()
    } else {
        meaningful.join("\n")
    }
}
