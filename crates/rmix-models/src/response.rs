//! HTTP response bodies.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::job::{JobStage, JobVariant};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Size in megabytes rounded to two decimals.
fn megabytes(bytes: u64) -> f64 {
    ((bytes as f64 / BYTES_PER_MB) * 100.0).round() / 100.0
}

/// Statistics of a produced video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoStats {
    /// Duration in seconds
    pub duration: f64,
    pub file_size: u64,
    #[serde(rename = "fileSizeMB")]
    pub file_size_mb: f64,
}

impl VideoStats {
    pub fn new(duration: f64, file_size: u64) -> Self {
        Self {
            duration,
            file_size,
            file_size_mb: megabytes(file_size),
        }
    }
}

/// Statistics of a produced image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageStats {
    pub file_size: u64,
    #[serde(rename = "fileSizeMB")]
    pub file_size_mb: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl ImageStats {
    pub fn new(file_size: u64, dimensions: Option<(u32, u32)>) -> Self {
        Self {
            file_size,
            file_size_mb: megabytes(file_size),
            width: dimensions.map(|(w, _)| w),
            height: dimensions.map(|(_, h)| h),
        }
    }
}

/// Response of the single-video and stitch endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoJobResponse {
    pub success: bool,
    pub job_id: String,
    pub download_url: String,
    pub final_video_url: String,
    pub video_stats: VideoStats,
    pub overlay_applied: bool,
    /// Number of scene clips concatenated (stitch only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_videos: Option<usize>,
    /// Scene numbers in concatenation order (stitch only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene_order: Option<Vec<i64>>,
}

/// Response of the image-overlay endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageJobResponse {
    pub success: bool,
    pub job_id: String,
    pub download_url: String,
    pub final_image_url: String,
    pub image_stats: ImageStats,
    pub overlay_applied: bool,
}

/// Response of `GET /api/status/:jobId`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    /// `completed`, `failed` or `processing`
    pub status: String,
    pub completed: bool,
    /// Whether the job registry knows this id
    pub tracked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<JobStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<JobVariant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(rename = "fileSizeMB", skip_serializing_if = "Option::is_none")]
    pub file_size_mb: Option<f64>,
}

impl JobStatusResponse {
    /// Answer for a job that has not produced an artifact yet.
    pub fn processing(tracked: bool) -> Self {
        Self {
            status: "processing".to_string(),
            completed: false,
            tracked,
            ..Default::default()
        }
    }

    /// Answer for a job whose artifact exists.
    pub fn completed(tracked: bool, download_url: impl Into<String>, file_size: u64) -> Self {
        Self {
            status: "completed".to_string(),
            completed: true,
            tracked,
            download_url: Some(download_url.into()),
            file_size: Some(file_size),
            file_size_mb: Some(megabytes(file_size)),
            ..Default::default()
        }
    }

    /// Answer for a job the registry saw fail.
    pub fn failed(error: Option<String>) -> Self {
        Self {
            status: "failed".to_string(),
            completed: false,
            tracked: true,
            stage: Some(JobStage::Failed),
            error,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_stats_field_names() {
        let stats = VideoStats::new(12.5, 3 * 1024 * 1024);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["duration"], 12.5);
        assert_eq!(json["fileSize"], 3 * 1024 * 1024);
        assert_eq!(json["fileSizeMB"], 3.0);
    }

    #[test]
    fn test_megabytes_rounding() {
        assert_eq!(megabytes(1_500_000), 1.43);
        assert_eq!(megabytes(0), 0.0);
    }

    #[test]
    fn test_processing_status_shape() {
        let json = serde_json::to_value(JobStatusResponse::processing(false)).unwrap();
        assert_eq!(json["status"], "processing");
        assert_eq!(json["completed"], false);
        assert!(json.get("fileSize").is_none());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_stitch_fields_skipped_for_single() {
        let resp = VideoJobResponse {
            success: true,
            job_id: "j".to_string(),
            download_url: "/download/j".to_string(),
            final_video_url: "/output/final_video_j.mp4".to_string(),
            video_stats: VideoStats::new(1.0, 1),
            overlay_applied: false,
            processed_videos: None,
            scene_order: None,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["overlayApplied"], false);
        assert!(json.get("sceneOrder").is_none());
        assert!(json.get("videoStats").is_some());
    }
}
