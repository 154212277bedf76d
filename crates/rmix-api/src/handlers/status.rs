//! Job status polling.

use axum::extract::{Path, State};
use axum::Json;

use rmix_models::{ArtifactKind, JobId, JobRecord, JobStage, JobStatusResponse, JobVariant};

use crate::error::{ApiError, ApiResult};
use crate::security::is_valid_job_id;
use crate::state::AppState;

fn artifact_kind(variant: JobVariant) -> ArtifactKind {
    match variant {
        JobVariant::ImageOverlay => ArtifactKind::Image,
        JobVariant::Single | JobVariant::Stitch => ArtifactKind::Video,
    }
}

fn download_url(kind: ArtifactKind, job_id: &JobId) -> String {
    match kind {
        ArtifactKind::Video => format!("/download/{}", job_id),
        ArtifactKind::Image => format!("/download-image/{}", job_id),
    }
}

/// Size of the artifact if it is on disk.
async fn artifact_size(state: &AppState, kind: ArtifactKind, job_id: &JobId) -> Option<u64> {
    tokio::fs::metadata(state.artifact_path(kind, job_id))
        .await
        .ok()
        .filter(|m| m.is_file())
        .map(|m| m.len())
}

async fn tracked_status(state: &AppState, job_id: &JobId, record: JobRecord) -> JobStatusResponse {
    let kind = artifact_kind(record.variant);
    let mut response = match record.stage {
        JobStage::Failed => JobStatusResponse::failed(record.error.clone()),
        JobStage::Completed => match artifact_size(state, kind, job_id).await {
            Some(size) => JobStatusResponse::completed(true, download_url(kind, job_id), size),
            None => JobStatusResponse::processing(true),
        },
        _ => JobStatusResponse::processing(true),
    };
    response.stage = Some(record.stage);
    response.variant = Some(record.variant);
    response
}

/// Report whether a job is done.
///
/// The registry answers for jobs this process accepted. Other ids fall back
/// to checking for an artifact on disk; with none present the job reads as
/// processing, same as one still running.
///
/// GET /api/status/:job_id
pub async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobStatusResponse>> {
    if !is_valid_job_id(&job_id) {
        return Err(ApiError::bad_request("Invalid job ID format"));
    }
    let job_id = JobId::from_string(job_id);

    if let Some(record) = state.registry.get(&job_id).await {
        return Ok(Json(tracked_status(&state, &job_id, record).await));
    }

    for kind in [ArtifactKind::Video, ArtifactKind::Image] {
        if let Some(size) = artifact_size(&state, kind, &job_id).await {
            return Ok(Json(JobStatusResponse::completed(
                false,
                download_url(kind, &job_id),
                size,
            )));
        }
    }

    Ok(Json(JobStatusResponse::processing(false)))
}
