//! Durable output artifact naming.

use serde::{Deserialize, Serialize};

use crate::JobId;

/// Kind of deliverable a job produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Video,
    Image,
}

impl ArtifactKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Video => "mp4",
            ArtifactKind::Image => "png",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ArtifactKind::Video => "video/mp4",
            ArtifactKind::Image => "image/png",
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            ArtifactKind::Video => "final_video",
            ArtifactKind::Image => "final_image",
        }
    }
}

/// File name of the artifact for a job, e.g. `final_video_<jobId>.mp4`.
pub fn artifact_file_name(kind: ArtifactKind, job_id: &JobId) -> String {
    format!("{}_{}.{}", kind.prefix(), job_id, kind.extension())
}
