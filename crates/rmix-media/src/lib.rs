//! Media building blocks for the ReelMix pipeline.
//!
//! This crate provides:
//! - Streaming HTTP asset downloads with a fixed timeout
//! - FFprobe duration and dimension probing
//! - A typed filter-graph value and pure builders for each transform
//! - The FFmpeg executor that serializes a graph into command arguments

pub mod command;
pub mod download;
pub mod error;
pub mod filters;
pub mod fs_utils;
pub mod graph;
pub mod probe;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegRunner, TransformInvocation};
pub use download::{validate_url, AssetFetcher, DEFAULT_FETCH_TIMEOUT};
pub use error::{MediaError, MediaResult};
pub use filters::{
    compose_video, concat_videos, overlay_image, overlay_position, trim_audio, ComposeOptions,
    Placement,
};
pub use graph::{
    Coord, FilterGraphSpec, FilterNode, FilterOp, OutputCodec, Pad, StreamKind, VideoEncoding,
};
pub use probe::{probe_dimensions, probe_duration, MediaProbe};
