//! Stitch scene entries.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scene number as supplied by clients: either a JSON integer or a numeric string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum SceneNumber {
    Integer(i64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("scene_number is not an integer: {0}")]
pub struct SceneNumberError(pub String);

impl SceneNumber {
    /// Numeric value used for ordering.
    pub fn value(&self) -> Result<i64, SceneNumberError> {
        match self {
            SceneNumber::Integer(n) => Ok(*n),
            SceneNumber::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| SceneNumberError(s.clone())),
        }
    }
}

/// One validated scene of a stitch job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SceneEntry {
    pub scene_number: i64,
    pub video_url: String,
}

impl SceneEntry {
    pub fn new(scene_number: i64, video_url: impl Into<String>) -> Self {
        Self {
            scene_number,
            video_url: video_url.into(),
        }
    }
}
