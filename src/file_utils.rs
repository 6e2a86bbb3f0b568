use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::ProviderError;
use crate::providers::{MediaData, MediaLoader, MediaRef};
use crate::subtitle::codec;

// @module: File and directory utilities

/// Suffix of the subtitle file written next to the video
pub const SUBTITLE_SUFFIX: &str = "_subtitles.srt";

/// Suffix of the captioned video
pub const VIDEO_SUFFIX: &str = "_with_subtitles.mp4";

// @const: Common video file extensions supported by ffmpeg
const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v", "mpg", "mpeg", "ogv", "ts", "mts", "m2ts",
];

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    // @generates: `<stem>_subtitles.srt` in `output_dir`
    pub fn subtitle_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(input_file: P1, output_dir: P2) -> PathBuf {
        Self::output_path(input_file.as_ref(), output_dir.as_ref(), SUBTITLE_SUFFIX)
    }

    // @generates: `<stem>_with_subtitles.mp4` in `output_dir`
    pub fn video_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(input_file: P1, output_dir: P2) -> PathBuf {
        Self::output_path(input_file.as_ref(), output_dir.as_ref(), VIDEO_SUFFIX)
    }

    fn output_path(input_file: &Path, output_dir: &Path, suffix: &str) -> PathBuf {
        let stem = input_file
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "video".to_string());
        output_dir.join(format!("{}{}", stem, suffix))
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path).with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        Self::write_bytes(path, content.as_bytes())
    }

    /// Write bytes to a file, creating the parent directory
    pub fn write_bytes<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Detect if a file is a subtitle file (SRT) or a video file
    pub fn detect_file_type<P: AsRef<Path>>(path: P) -> Result<FileType> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(anyhow::anyhow!("File does not exist: {:?}", path));
        }

        if let Some(ext) = path.extension() {
            let ext_str = ext.to_string_lossy().to_lowercase();
            if ext_str == "srt" {
                return Ok(FileType::Subtitle);
            }
            if VIDEO_EXTENSIONS.contains(&ext_str.as_str()) {
                return Ok(FileType::Video);
            }
        }

        // Fall back to examining file contents
        if let Ok(content) = fs::read_to_string(path) {
            if codec::validate(&content).is_ok() {
                return Ok(FileType::Subtitle);
            }
        }

        Ok(FileType::Unknown)
    }
}

/// Enum representing different file types
#[derive(Debug, PartialEq, Eq)]
pub enum FileType {
    /// Subtitle file (SRT)
    Subtitle,
    /// Video file supported by ffmpeg
    Video,
    /// Unknown file type
    Unknown,
}

/// Loads media from the local file system
#[derive(Debug, Default, Clone, Copy)]
pub struct FsMediaLoader;

#[async_trait]
impl MediaLoader for FsMediaLoader {
    async fn load(&self, media: &MediaRef) -> Result<MediaData, ProviderError> {
        match media {
            MediaRef::Path(path) => {
                let bytes = tokio::fs::read(path)
                    .await
                    .map_err(|e| ProviderError::Io(format!("{}: {}", path.display(), e)))?;
                debug!("Read {} bytes from {}", bytes.len(), path.display());
                Ok(MediaData {
                    name: media.name(),
                    bytes: Bytes::from(bytes),
                })
            }
            MediaRef::Memory { name, bytes } => Ok(MediaData {
                name: name.clone(),
                bytes: bytes.clone(),
            }),
        }
    }
}
