//! FFprobe duration and dimension queries.

use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

impl FfprobeOutput {
    fn duration(&self) -> Option<f64> {
        self.format
            .as_ref()?
            .duration
            .as_ref()?
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite() && *d >= 0.0)
    }

    fn dimensions(&self) -> Option<(u32, u32)> {
        let stream = self
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))?;
        match (stream.width, stream.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        }
    }
}

/// Container-level inspection of local media files.
#[derive(Debug, Clone, Copy, Default)]
pub struct MediaProbe;

impl MediaProbe {
    pub fn new() -> Self {
        Self
    }

    /// Container duration in seconds.
    pub async fn duration(&self, path: impl AsRef<Path>) -> MediaResult<f64> {
        probe_duration(path).await
    }

    /// Width and height of the first video stream.
    pub async fn dimensions(&self, path: impl AsRef<Path>) -> MediaResult<(u32, u32)> {
        probe_dimensions(path).await
    }
}

async fn run_ffprobe(path: &Path) -> MediaResult<FfprobeOutput> {
    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::ProbeFailed {
            path: path.to_path_buf(),
            message: "FFprobe exited with non-zero status".to_string(),
            stderr: Some(String::from_utf8_lossy(&output.stderr).trim().to_string()),
        });
    }

    Ok(serde_json::from_slice(&output.stdout)?)
}

/// Get media duration in seconds.
///
/// Fails when the container reports no parsable duration.
pub async fn probe_duration(path: impl AsRef<Path>) -> MediaResult<f64> {
    let path = path.as_ref();
    run_ffprobe(path)
        .await?
        .duration()
        .ok_or_else(|| MediaError::probe_failed(path, "no duration reported"))
}

/// Get width and height of the first video stream.
pub async fn probe_dimensions(path: impl AsRef<Path>) -> MediaResult<(u32, u32)> {
    let path = path.as_ref();
    run_ffprobe(path)
        .await?
        .dimensions()
        .ok_or_else(|| MediaError::probe_failed(path, "no video stream with dimensions"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> FfprobeOutput {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_duration_parsing() {
        let out = parse(r#"{"format": {"duration": "12.480000"}, "streams": []}"#);
        assert!((out.duration().unwrap() - 12.48).abs() < 1e-9);
    }

    #[test]
    fn test_missing_duration() {
        assert!(parse(r#"{"format": {}, "streams": []}"#).duration().is_none());
        assert!(parse(r#"{"streams": []}"#).duration().is_none());
        assert!(parse(r#"{"format": {"duration": "N/A"}}"#).duration().is_none());
    }

    #[test]
    fn test_dimensions_from_first_video_stream() {
        let out = parse(
            r#"{"streams": [
                {"codec_type": "audio"},
                {"codec_type": "video", "width": 1920, "height": 1080},
                {"codec_type": "video", "width": 640, "height": 360}
            ]}"#,
        );
        assert_eq!(out.dimensions(), Some((1920, 1080)));
    }

    #[test]
    fn test_no_video_stream() {
        let out = parse(r#"{"streams": [{"codec_type": "audio"}]}"#);
        assert!(out.dimensions().is_none());
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = probe_duration("/nonexistent/clip.mp4").await.unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
