//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while fetching, probing or transforming media.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("Invalid asset URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Download of {url} failed: {message}")]
    DownloadFailed { url: String, message: String },

    #[error("Download of {url} returned HTTP {status}")]
    DownloadStatus { url: String, status: u16 },

    #[error("Download of {url} timed out after {timeout_secs} seconds")]
    DownloadTimeout { url: String, timeout_secs: u64 },

    #[error("FFprobe failed for {path}: {message}")]
    ProbeFailed {
        path: PathBuf,
        message: String,
        stderr: Option<String>,
    },

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Create a download failure error.
    pub fn download_failed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DownloadFailed {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a probe failure error.
    pub fn probe_failed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ProbeFailed {
            path: path.into(),
            message: message.into(),
            stderr: None,
        }
    }

    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Whether the error came from the network side of a fetch.
    pub fn is_fetch(&self) -> bool {
        matches!(
            self,
            MediaError::InvalidUrl { .. }
                | MediaError::DownloadFailed { .. }
                | MediaError::DownloadStatus { .. }
                | MediaError::DownloadTimeout { .. }
        )
    }

    /// Whether the error came from inspecting a media file.
    pub fn is_probe(&self) -> bool {
        matches!(
            self,
            MediaError::FfprobeNotFound | MediaError::ProbeFailed { .. } | MediaError::JsonParse(_)
        )
    }

    /// Whether the error came from the transcoding engine.
    pub fn is_transform(&self) -> bool {
        matches!(self, MediaError::FfmpegNotFound | MediaError::FfmpegFailed { .. })
    }
}
