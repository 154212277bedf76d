//! Fetched input assets.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Role an input plays in a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetKind {
    Video,
    Audio,
    OverlayImage,
    BaseImage,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Video => "video",
            AssetKind::Audio => "audio",
            AssetKind::OverlayImage => "overlay-image",
            AssetKind::BaseImage => "base-image",
        }
    }

    /// Extension used for the local copy inside a working directory.
    pub fn local_extension(&self) -> &'static str {
        match self {
            AssetKind::Video => "mp4",
            AssetKind::Audio => "mp3",
            AssetKind::OverlayImage | AssetKind::BaseImage => "png",
        }
    }
}

/// A remote input and its local copy. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub kind: AssetKind,
    pub source_url: String,
    pub local_path: PathBuf,
}

impl Asset {
    pub fn new(kind: AssetKind, source_url: impl Into<String>, local_path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            source_url: source_url.into(),
            local_path: local_path.into(),
        }
    }
}
