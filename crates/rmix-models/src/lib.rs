//! Shared data models for the ReelMix media pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs, job stages and the job registry record
//! - Fetched assets and stitch scene entries
//! - Overlay placement options
//! - Durable artifact naming
//! - HTTP request and response bodies

pub mod artifact;
pub mod asset;
pub mod job;
pub mod overlay;
pub mod request;
pub mod response;
pub mod scene;

// Re-export common types
pub use artifact::{artifact_file_name, ArtifactKind};
pub use asset::{Asset, AssetKind};
pub use job::{JobId, JobRecord, JobStage, JobVariant};
pub use overlay::{OverlayOptions, OverlayPosition, DEFAULT_OVERLAY_MARGIN, DEFAULT_OVERLAY_SIZE};
pub use request::{
    AddImageOverlayRequest, AddOverlayRequest, OverlayOptionsInput, SceneInput,
    StitchVideosRequest,
};
pub use response::{
    ImageJobResponse, ImageStats, JobStatusResponse, VideoJobResponse, VideoStats,
};
pub use scene::{SceneEntry, SceneNumber, SceneNumberError};
