//! Worker error types.

use rmix_media::MediaError;
use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Job failure, classified by the stage that produced it.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Missing or malformed request input; raised before any work starts
    #[error("{0}")]
    Validation(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Probe failed: {0}")]
    Probe(String),

    #[error("Transform failed: {0}")]
    Transform(String),

    #[error("Filesystem error: {0}")]
    Filesystem(String),
}

impl WorkerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn filesystem(msg: impl Into<String>) -> Self {
        Self::Filesystem(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, WorkerError::Validation(_))
    }

    /// Short name used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerError::Validation(_) => "validation",
            WorkerError::Fetch(_) => "fetch",
            WorkerError::Probe(_) => "probe",
            WorkerError::Transform(_) => "transform",
            WorkerError::Filesystem(_) => "filesystem",
        }
    }
}

impl From<MediaError> for WorkerError {
    fn from(e: MediaError) -> Self {
        let msg = match &e {
            MediaError::FfmpegFailed {
                message,
                stderr: Some(stderr),
                ..
            } if !stderr.is_empty() => format!("{}: {}", message, stderr),
            _ => e.to_string(),
        };

        if matches!(e, MediaError::InvalidUrl { .. }) {
            WorkerError::Validation(msg)
        } else if e.is_fetch() {
            WorkerError::Fetch(msg)
        } else if e.is_probe() {
            WorkerError::Probe(msg)
        } else if e.is_transform() {
            WorkerError::Transform(msg)
        } else {
            WorkerError::Filesystem(msg)
        }
    }
}

impl From<std::io::Error> for WorkerError {
    fn from(e: std::io::Error) -> Self {
        WorkerError::Filesystem(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_media_error_mapping() {
        let fetch: WorkerError = MediaError::DownloadStatus {
            url: "http://x/a.mp4".into(),
            status: 404,
        }
        .into();
        assert_eq!(fetch.kind(), "fetch");

        let probe: WorkerError = MediaError::probe_failed("/tmp/a.mp4", "no duration").into();
        assert_eq!(probe.kind(), "probe");

        let transform: WorkerError =
            MediaError::ffmpeg_failed("concat exited", Some("Invalid data".into()), Some(1)).into();
        assert_eq!(transform.kind(), "transform");
        assert!(transform.to_string().contains("Invalid data"));

        let fs: WorkerError = MediaError::FileNotFound(PathBuf::from("/x")).into();
        assert_eq!(fs.kind(), "filesystem");
    }

    #[test]
    fn test_bad_url_is_validation() {
        let err: WorkerError = MediaError::InvalidUrl {
            url: "ftp://x".into(),
            message: "unsupported scheme".into(),
        }
        .into();
        assert!(err.is_validation());
    }
}
