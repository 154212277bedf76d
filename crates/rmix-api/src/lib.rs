//! Axum HTTP API server.
//!
//! This crate provides:
//! - Job submission endpoints for the three pipeline variants
//! - Artifact delivery with byte-range streaming
//! - Registry-backed status polling
//! - Security headers, request ids and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod range;
pub mod routes;
pub mod security;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::RegistrySweeper;
pub use state::AppState;
