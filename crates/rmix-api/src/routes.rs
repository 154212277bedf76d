//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;

use crate::handlers::{
    add_image_overlay, add_overlay, download_image, download_video, health, job_status, ready,
    serve_image, stitch_videos, stream_video,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, request_id, request_logging, security_headers};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    crate::error::set_expose_internal(!state.config.is_production());

    let api_routes = Router::new()
        .route("/add-overlay", post(add_overlay))
        .route("/add-image-overlay", post(add_image_overlay))
        .route("/stitch-videos", post(stitch_videos))
        .route("/status/:job_id", get(job_status));

    let delivery_routes = Router::new()
        .route("/download/:job_id", get(download_video))
        .route("/download-image/:job_id", get(download_image))
        .route("/serve-image/:job_id", get(serve_image))
        .route("/stream/:job_id", get(stream_video))
        .nest_service("/output", ServeDir::new(state.output_dir()));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(delivery_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        // Json's built-in 2 MB cap would otherwise undercut max_body_size.
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_logging))
        .layer(middleware::from_fn(request_id))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
