//! Artifact delivery: whole-file downloads and range-aware streaming.

use std::io::SeekFrom;
use std::path::Path;

use axum::body::Body;
use axum::extract::{Path as PathParam, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use rmix_models::{artifact_file_name, ArtifactKind, JobId};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::range::{parse_range, ByteRange};
use crate::security::is_valid_job_id;
use crate::state::AppState;

/// How the artifact is presented to the client.
#[derive(Debug, Clone, Copy)]
enum Disposition {
    Attachment,
    Inline,
}

fn parse_job_id(raw: String) -> ApiResult<JobId> {
    if !is_valid_job_id(&raw) {
        return Err(ApiError::bad_request("Invalid job ID format"));
    }
    Ok(JobId::from_string(raw))
}

/// Open an artifact and return it with its size, or a 404.
async fn open_artifact(path: &Path, kind: ArtifactKind, job_id: &JobId) -> ApiResult<(File, u64)> {
    let not_found = || {
        let what = match kind {
            ArtifactKind::Video => "Video not found",
            ArtifactKind::Image => "Image not found",
        };
        ApiError::not_found(what, format!("No output for job {}", job_id))
    };

    let file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
        Err(e) => return Err(ApiError::internal(format!("Failed to open artifact: {}", e))),
    };
    let meta = file
        .metadata()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to stat artifact: {}", e)))?;
    if !meta.is_file() {
        return Err(not_found());
    }
    Ok((file, meta.len()))
}

async fn serve_whole(
    state: &AppState,
    raw_id: String,
    kind: ArtifactKind,
    disposition: Disposition,
    route: &'static str,
) -> ApiResult<Response> {
    let job_id = parse_job_id(raw_id)?;
    let path = state.artifact_path(kind, &job_id);
    let (file, size) = open_artifact(&path, kind, &job_id).await?;

    let disposition = match disposition {
        Disposition::Attachment => {
            format!("attachment; filename=\"{}\"", artifact_file_name(kind, &job_id))
        }
        Disposition::Inline => "inline".to_string(),
    };

    metrics::record_artifact_served(route, size);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, kind.content_type())
        .header(header::CONTENT_LENGTH, size)
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .header("Cross-Origin-Resource-Policy", "cross-origin")
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))
}

/// Download the final video as an attachment.
///
/// GET /download/:job_id
pub async fn download_video(
    State(state): State<AppState>,
    PathParam(job_id): PathParam<String>,
) -> ApiResult<Response> {
    serve_whole(&state, job_id, ArtifactKind::Video, Disposition::Attachment, "download").await
}

/// Download the final image as an attachment.
///
/// GET /download-image/:job_id
pub async fn download_image(
    State(state): State<AppState>,
    PathParam(job_id): PathParam<String>,
) -> ApiResult<Response> {
    serve_whole(&state, job_id, ArtifactKind::Image, Disposition::Attachment, "download-image").await
}

/// Serve the final image inline for embedding.
///
/// GET /serve-image/:job_id
pub async fn serve_image(
    State(state): State<AppState>,
    PathParam(job_id): PathParam<String>,
) -> ApiResult<Response> {
    serve_whole(&state, job_id, ArtifactKind::Image, Disposition::Inline, "serve-image").await
}

/// Stream the final video, honouring a single byte range.
///
/// GET /stream/:job_id
pub async fn stream_video(
    State(state): State<AppState>,
    PathParam(job_id): PathParam<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let job_id = parse_job_id(job_id)?;
    let path = state.artifact_path(ArtifactKind::Video, &job_id);
    let (mut file, size) = open_artifact(&path, ArtifactKind::Video, &job_id).await?;

    let range_header = headers.get(header::RANGE).and_then(|v| v.to_str().ok());
    let range = parse_range(range_header, size);

    let builder = Response::builder()
        .header(header::CONTENT_TYPE, ArtifactKind::Video.content_type())
        .header(header::ACCEPT_RANGES, "bytes")
        .header("Cross-Origin-Resource-Policy", "cross-origin");

    let response = match range {
        ByteRange::Unsatisfiable => return Err(ApiError::RangeNotSatisfiable { size }),
        ByteRange::Full => builder
            .status(StatusCode::OK)
            .header(header::CONTENT_LENGTH, size)
            .body(Body::from_stream(ReaderStream::new(file))),
        ByteRange::Partial { start, end } => {
            let len = range.len(size);
            file.seek(SeekFrom::Start(start))
                .await
                .map_err(|e| ApiError::internal(format!("Failed to seek artifact: {}", e)))?;
            builder
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_RANGE, format!("bytes {}-{}/{}", start, end, size))
                .header(header::CONTENT_LENGTH, len)
                .body(Body::from_stream(ReaderStream::new(file.take(len))))
        }
    };

    metrics::record_artifact_served("stream", range.len(size));

    response.map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))
}
