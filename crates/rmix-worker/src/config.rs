//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use rmix_media::{ComposeOptions, VideoEncoding, DEFAULT_FETCH_TIMEOUT};

use crate::error::{WorkerError, WorkerResult};

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Durable artifact root
    pub output_dir: PathBuf,
    /// Parent of the per-job working directories
    pub temp_dir: PathBuf,
    /// Budget for a single asset download
    pub fetch_timeout: Duration,
    /// How long terminal registry records are kept
    pub job_retention: Duration,
    /// How often expired registry records are pruned
    pub sweep_interval: Duration,
    /// Re-encode settings for video outputs
    pub video: VideoEncoding,
    pub audio_codec: String,
    pub audio_bitrate: String,
    /// Gain applied to the replacement music track
    pub music_gain: f64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./output"),
            temp_dir: PathBuf::from("./temp"),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            job_retention: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(60),
            video: VideoEncoding::default(),
            audio_codec: "aac".to_string(),
            audio_bitrate: "192k".to_string(),
            music_gain: 1.0,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            output_dir: std::env::var("RMIX_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            temp_dir: std::env::var("RMIX_TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.temp_dir),
            fetch_timeout: std::env::var("RMIX_FETCH_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.fetch_timeout),
            job_retention: std::env::var("RMIX_JOB_RETENTION_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.job_retention),
            sweep_interval: std::env::var("RMIX_SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_interval),
            video: VideoEncoding {
                codec: std::env::var("RMIX_VIDEO_CODEC").unwrap_or(defaults.video.codec),
                preset: std::env::var("RMIX_PRESET").unwrap_or(defaults.video.preset),
                crf: std::env::var("RMIX_CRF")
                    .ok()
                    .and_then(|s| s.parse::<u8>().ok())
                    .filter(|crf| *crf <= 51)
                    .unwrap_or(defaults.video.crf),
            },
            audio_codec: std::env::var("RMIX_AUDIO_CODEC").unwrap_or(defaults.audio_codec),
            audio_bitrate: std::env::var("RMIX_AUDIO_BITRATE").unwrap_or(defaults.audio_bitrate),
            music_gain: std::env::var("RMIX_MUSIC_GAIN")
                .ok()
                .and_then(|s| s.parse::<f64>().ok())
                .filter(|g| g.is_finite() && *g >= 0.0)
                .unwrap_or(defaults.music_gain),
        }
    }

    /// Create the output and temp roots.
    pub async fn prepare_dirs(&self) -> WorkerResult<()> {
        for dir in [&self.output_dir, &self.temp_dir] {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                WorkerError::filesystem(format!("cannot create {}: {}", dir.display(), e))
            })?;
        }
        Ok(())
    }

    /// Encoder settings handed to the filter-graph builders.
    pub fn compose_options(&self) -> ComposeOptions {
        ComposeOptions {
            video: self.video.clone(),
            audio_codec: self.audio_codec.clone(),
            audio_bitrate: self.audio_bitrate.clone(),
            audio_gain: self.music_gain,
        }
    }
}
