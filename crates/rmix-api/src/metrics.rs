//! Prometheus metrics for the API server.

use std::sync::LazyLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use regex_lite::Regex;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    pub const HTTP_REQUESTS_TOTAL: &str = "rmix_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "rmix_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "rmix_http_requests_in_flight";

    pub const ARTIFACT_BYTES_SERVED: &str = "rmix_artifact_bytes_served_total";
    pub const JOBS_TRACKED: &str = "rmix_jobs_tracked";
    pub const JOBS_PRUNED_TOTAL: &str = "rmix_jobs_pruned_total";
}

static JOB_ROUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/(download|download-image|serve-image|stream|api/status)/[^/]+$")
        .expect("valid job route regex")
});

static OUTPUT_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/output/.+$").expect("valid output regex"));

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record artifact bytes written to a response.
pub fn record_artifact_served(route: &'static str, bytes: u64) {
    counter!(names::ARTIFACT_BYTES_SERVED, "route" => route).increment(bytes);
}

/// Update the tracked-jobs gauge and count pruned records.
pub fn record_registry_sweep(tracked: usize, pruned: usize) {
    gauge!(names::JOBS_TRACKED).set(tracked as f64);
    counter!(names::JOBS_PRUNED_TOTAL).increment(pruned as u64);
}

/// Collapse job ids and file names so label cardinality stays bounded.
fn sanitize_path(path: &str) -> String {
    let path = JOB_ROUTE.replace(path, "/$1/:job_id");
    OUTPUT_FILE.replace(&path, "/output/:file").to_string()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(
            sanitize_path("/stream/550e8400-e29b-41d4-a716-446655440000"),
            "/stream/:job_id"
        );
        assert_eq!(sanitize_path("/api/status/abcd1234"), "/api/status/:job_id");
        assert_eq!(
            sanitize_path("/output/final_video_abcd1234.mp4"),
            "/output/:file"
        );
        assert_eq!(sanitize_path("/api/stitch-videos"), "/api/stitch-videos");
    }
}
