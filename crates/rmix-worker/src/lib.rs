//! Media job orchestration.
//!
//! This crate provides:
//! - The job orchestrator for the single, stitch and image-overlay variants
//! - Per-job scoped working directories
//! - An in-process job registry with bounded retention
//! - Scene ordering for stitch jobs

pub mod config;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod registry;
pub mod scenes;
pub mod workspace;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use logging::JobLogger;
pub use orchestrator::{ImageOutcome, JobOrchestrator, JobOutcome, JobRequest, VideoOutcome};
pub use registry::JobRegistry;
pub use scenes::{order_scenes, SceneOrder};
pub use workspace::JobWorkspace;
