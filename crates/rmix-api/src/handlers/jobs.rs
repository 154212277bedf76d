//! Job submission handlers.
//!
//! Each handler validates the body, runs the job on its own task and answers
//! once the artifact is in the output root. The job task outlives the request,
//! so a client hanging up never cancels an accepted job.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tracing::{error, info};

use rmix_models::{
    artifact_file_name, AddImageOverlayRequest, AddOverlayRequest, ArtifactKind, ImageJobResponse,
    ImageStats, JobId, StitchVideosRequest, VideoJobResponse, VideoStats,
};
use rmix_worker::{ImageOutcome, JobOutcome, JobRequest, VideoOutcome};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Public URL of an artifact served by the static output route.
fn output_url(kind: ArtifactKind, job_id: &JobId) -> String {
    format!("/output/{}", artifact_file_name(kind, job_id))
}

fn video_response(job_id: &JobId, outcome: VideoOutcome) -> VideoJobResponse {
    VideoJobResponse {
        success: true,
        job_id: job_id.to_string(),
        download_url: format!("/download/{}", job_id),
        final_video_url: output_url(ArtifactKind::Video, job_id),
        video_stats: VideoStats::new(outcome.duration, outcome.file_size),
        overlay_applied: outcome.overlay_applied,
        processed_videos: outcome.scene_order.as_ref().map(Vec::len),
        scene_order: outcome.scene_order,
    }
}

fn image_response(job_id: &JobId, outcome: ImageOutcome) -> ImageJobResponse {
    ImageJobResponse {
        success: true,
        job_id: job_id.to_string(),
        download_url: format!("/download-image/{}", job_id),
        final_image_url: output_url(ArtifactKind::Image, job_id),
        image_stats: ImageStats::new(outcome.file_size, outcome.dimensions),
        overlay_applied: outcome.overlay_applied,
    }
}

/// Accept a job and run it to completion on a detached task.
async fn spawn_job(state: &AppState, request: JobRequest) -> (JobId, ApiResult<JobOutcome>) {
    let job_id = JobId::new();
    info!(job_id = %job_id, variant = %request.variant(), "Job accepted");

    let orchestrator = state.orchestrator.clone();
    let task_id = job_id.clone();
    let handle = tokio::spawn(async move { orchestrator.run(&task_id, request).await });

    let result = match handle.await {
        Ok(Ok(outcome)) => Ok(outcome),
        Ok(Err(e)) => Err(ApiError::from_job(&job_id, e)),
        Err(e) => {
            error!(job_id = %job_id, "Job task aborted: {}", e);
            state.registry.fail(&job_id, format!("job task aborted: {}", e)).await;
            Err(ApiError::JobFailed {
                job_id: job_id.to_string(),
                message: "Job task aborted".to_string(),
            })
        }
    };
    (job_id, result)
}

async fn run_video_job(state: &AppState, request: JobRequest) -> ApiResult<Json<VideoJobResponse>> {
    match spawn_job(state, request).await {
        (job_id, Ok(JobOutcome::Video(outcome))) => Ok(Json(video_response(&job_id, outcome))),
        (_, Ok(JobOutcome::Image(_))) => Err(ApiError::internal("video job produced an image")),
        (_, Err(e)) => Err(e),
    }
}

/// Replace a video's audio with a trimmed music track, optionally with an overlay.
///
/// POST /api/add-overlay
pub async fn add_overlay(
    State(state): State<AppState>,
    payload: Result<Json<AddOverlayRequest>, JsonRejection>,
) -> ApiResult<Json<VideoJobResponse>> {
    let Json(body) = payload?;
    let request = JobRequest::try_from(&body)?;
    run_video_job(&state, request).await
}

/// Concatenate scenes in scene-number order, then add music and overlay.
///
/// POST /api/stitch-videos
pub async fn stitch_videos(
    State(state): State<AppState>,
    payload: Result<Json<StitchVideosRequest>, JsonRejection>,
) -> ApiResult<Json<VideoJobResponse>> {
    let Json(body) = payload?;
    let request = JobRequest::try_from(&body)?;
    run_video_job(&state, request).await
}

/// Composite an overlay image onto a base image.
///
/// POST /api/add-image-overlay
pub async fn add_image_overlay(
    State(state): State<AppState>,
    payload: Result<Json<AddImageOverlayRequest>, JsonRejection>,
) -> ApiResult<Json<ImageJobResponse>> {
    let Json(body) = payload?;
    let request = JobRequest::try_from(&body)?;

    match spawn_job(&state, request).await {
        (job_id, Ok(JobOutcome::Image(outcome))) => Ok(Json(image_response(&job_id, outcome))),
        (_, Ok(JobOutcome::Video(_))) => Err(ApiError::internal("image job produced a video")),
        (_, Err(e)) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_stitch_response_shape() {
        let job_id = JobId::from_string("job-12345678");
        let outcome = VideoOutcome {
            artifact_path: PathBuf::from("/out/final_video_job-12345678.mp4"),
            duration: 31.5,
            file_size: 2 * 1024 * 1024,
            overlay_applied: true,
            scene_order: Some(vec![1, 2, 3]),
        };
        let body = serde_json::to_value(video_response(&job_id, outcome)).unwrap();

        assert_eq!(body["downloadUrl"], "/download/job-12345678");
        assert_eq!(body["finalVideoUrl"], "/output/final_video_job-12345678.mp4");
        assert_eq!(body["processedVideos"], 3);
        assert_eq!(body["sceneOrder"], serde_json::json!([1, 2, 3]));
        assert_eq!(body["videoStats"]["fileSizeMB"], 2.0);
        assert_eq!(body["overlayApplied"], true);
    }

    #[test]
    fn test_single_response_omits_stitch_fields() {
        let job_id = JobId::from_string("job-87654321");
        let outcome = VideoOutcome {
            artifact_path: PathBuf::from("/out/x.mp4"),
            duration: 10.0,
            file_size: 1000,
            overlay_applied: false,
            scene_order: None,
        };
        let body = serde_json::to_value(video_response(&job_id, outcome)).unwrap();
        assert!(body.get("processedVideos").is_none());
        assert!(body.get("sceneOrder").is_none());
        assert_eq!(body["overlayApplied"], false);
    }
}
