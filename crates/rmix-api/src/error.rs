//! API error types.

use std::sync::atomic::{AtomicBool, Ordering};

use axum::extract::rejection::JsonRejection;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use rmix_models::JobId;
use rmix_worker::WorkerError;

pub type ApiResult<T> = Result<T, ApiError>;

const REDACTED_INTERNAL: &str = "An internal error occurred";

static EXPOSE_INTERNAL: AtomicBool = AtomicBool::new(true);

/// Whether 500 responses carry the internal error text. Set once from
/// `ApiConfig::is_production` when the router is built.
pub fn set_expose_internal(expose: bool) {
    EXPOSE_INTERNAL.store(expose, Ordering::Relaxed);
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{error}")]
    NotFound { error: String, details: String },

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Requested range not satisfiable")]
    RangeNotSatisfiable { size: u64 },

    /// A pipeline stage failed after the job was accepted
    #[error("{message}")]
    JobFailed { job_id: String, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self::NotFound {
            error: error.into(),
            details: details.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Map a job error: validation stays a 400, anything else is a 500
    /// that carries the job id.
    pub fn from_job(job_id: &JobId, err: WorkerError) -> Self {
        if err.is_validation() {
            Self::BadRequest(err.to_string())
        } else {
            Self::JobFailed {
                job_id: job_id.to_string(),
                message: err.to_string(),
            }
        }
    }

    /// Client-facing message; internal errors are redacted unless `expose_internal`.
    fn public_message(&self, expose_internal: bool) -> String {
        match self {
            ApiError::Internal(_) if !expose_internal => REDACTED_INTERNAL.to_string(),
            _ => self.to_string(),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            ApiError::JobFailed { .. } | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<WorkerError> for ApiError {
    fn from(err: WorkerError) -> Self {
        if err.is_validation() {
            Self::BadRequest(err.to_string())
        } else {
            Self::Internal(err.to_string())
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(rejection.body_text())
        } else {
            Self::BadRequest(rejection.body_text())
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    job_id: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let ApiError::RangeNotSatisfiable { size } = self {
            return (
                status,
                [(header::CONTENT_RANGE, format!("bytes */{}", size))],
            )
                .into_response();
        }

        let error = self.public_message(EXPOSE_INTERNAL.load(Ordering::Relaxed));

        let body = match self {
            ApiError::NotFound { details, .. } => ErrorResponse {
                success: false,
                error,
                details: Some(details),
                job_id: None,
            },
            ApiError::JobFailed { job_id, .. } => ErrorResponse {
                success: false,
                error,
                details: None,
                job_id: Some(job_id),
            },
            _ => ErrorResponse {
                success: false,
                error,
                details: None,
                job_id: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_error_mapping() {
        let id = JobId::from_string("job-abcdef12");
        let bad = ApiError::from_job(&id, WorkerError::validation("mv_audio is required"));
        assert_eq!(bad.status_code(), StatusCode::BAD_REQUEST);

        let failed = ApiError::from_job(&id, WorkerError::Fetch("HTTP 404".into()));
        assert_eq!(failed.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        match failed {
            ApiError::JobFailed { job_id, message } => {
                assert_eq!(job_id, "job-abcdef12");
                assert_eq!(message, "Fetch failed: HTTP 404");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_internal_message_redaction() {
        let err = ApiError::internal("disk full at /var/media");
        assert_eq!(err.public_message(true), "Internal error: disk full at /var/media");
        assert_eq!(err.public_message(false), "An internal error occurred");

        // Job failures keep their message regardless of environment
        let failed = ApiError::JobFailed {
            job_id: "job-1".into(),
            message: "Fetch failed: HTTP 404".into(),
        };
        assert_eq!(failed.public_message(false), "Fetch failed: HTTP 404");
    }

    #[test]
    fn test_range_error_header() {
        let response = ApiError::RangeNotSatisfiable { size: 1000 }.into_response();
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes */1000");
    }
}
