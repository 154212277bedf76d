//! HTTP request bodies.
//!
//! Every field is optional at the serde level so that missing inputs are
//! reported through `validate()` with a readable message instead of a
//! generic deserialization rejection.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::overlay::{OverlayOptions, OverlayPosition};
use crate::scene::SceneNumber;

/// Treat absent and blank strings the same way.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Overlay options as supplied by clients.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct OverlayOptionsInput {
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub margin: Option<u32>,
}

impl OverlayOptionsInput {
    /// Fill defaults and validate.
    pub fn resolve(&self) -> Result<OverlayOptions, String> {
        let defaults = OverlayOptions::default();
        let position = match present(&self.position) {
            Some(p) => p.parse::<OverlayPosition>()?,
            None => defaults.position,
        };
        let size = self.size.unwrap_or(defaults.size);
        if size == 0 {
            return Err("overlay_options.size must be greater than zero".to_string());
        }
        Ok(OverlayOptions {
            position,
            size,
            margin: self.margin.unwrap_or(defaults.margin),
        })
    }
}

fn resolve_options(input: &Option<OverlayOptionsInput>) -> Result<OverlayOptions, String> {
    input
        .as_ref()
        .map(OverlayOptionsInput::resolve)
        .unwrap_or_else(|| Ok(OverlayOptions::default()))
}

/// `POST /api/add-overlay`
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AddOverlayRequest {
    #[serde(default)]
    pub final_stitch_video: Option<String>,
    #[serde(default)]
    pub final_music_url: Option<String>,
    #[serde(default)]
    pub overlay_image_url: Option<String>,
    #[serde(default)]
    pub overlay_options: Option<OverlayOptionsInput>,
}

impl AddOverlayRequest {
    /// Validate the request.
    pub fn validate(&self) -> Result<(), String> {
        if present(&self.final_stitch_video).is_none() {
            return Err("final_stitch_video is required".to_string());
        }
        if present(&self.final_music_url).is_none() {
            return Err("final_music_url is required".to_string());
        }
        resolve_options(&self.overlay_options).map(|_| ())
    }

    pub fn video_url(&self) -> Option<&str> {
        present(&self.final_stitch_video)
    }

    pub fn music_url(&self) -> Option<&str> {
        present(&self.final_music_url)
    }

    pub fn overlay_url(&self) -> Option<&str> {
        present(&self.overlay_image_url)
    }

    pub fn overlay_options(&self) -> Result<OverlayOptions, String> {
        resolve_options(&self.overlay_options)
    }
}

/// `POST /api/add-image-overlay`
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AddImageOverlayRequest {
    #[serde(default)]
    pub final_image_url: Option<String>,
    #[serde(default)]
    pub overlay_image_url: Option<String>,
    #[serde(default)]
    pub overlay_options: Option<OverlayOptionsInput>,
}

impl AddImageOverlayRequest {
    /// Validate the request.
    pub fn validate(&self) -> Result<(), String> {
        if present(&self.final_image_url).is_none() {
            return Err("final_image_url is required".to_string());
        }
        if present(&self.overlay_image_url).is_none() {
            return Err("overlay_image_url is required".to_string());
        }
        resolve_options(&self.overlay_options).map(|_| ())
    }

    pub fn image_url(&self) -> Option<&str> {
        present(&self.final_image_url)
    }

    pub fn overlay_url(&self) -> Option<&str> {
        present(&self.overlay_image_url)
    }

    pub fn overlay_options(&self) -> Result<OverlayOptions, String> {
        resolve_options(&self.overlay_options)
    }
}

/// One scene of a stitch request.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SceneInput {
    #[serde(default)]
    pub scene_number: Option<SceneNumber>,
    #[serde(default)]
    pub final_video_url: Option<String>,
}

impl SceneInput {
    pub fn video_url(&self) -> Option<&str> {
        present(&self.final_video_url)
    }
}

/// `POST /api/stitch-videos`
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct StitchVideosRequest {
    #[serde(default)]
    pub videos: Vec<SceneInput>,
    #[serde(default)]
    pub mv_audio: Option<String>,
    #[serde(default)]
    pub overlay_image_url: Option<String>,
    #[serde(default)]
    pub overlay_options: Option<OverlayOptionsInput>,
}

impl StitchVideosRequest {
    /// Validate the request.
    pub fn validate(&self) -> Result<(), String> {
        if self.videos.is_empty() {
            return Err("videos must contain at least one scene".to_string());
        }
        if present(&self.mv_audio).is_none() {
            return Err("mv_audio is required".to_string());
        }
        for (index, scene) in self.videos.iter().enumerate() {
            let number = scene
                .scene_number
                .as_ref()
                .ok_or_else(|| format!("videos[{}].scene_number is required", index))?;
            number
                .value()
                .map_err(|e| format!("videos[{}]: {}", index, e))?;
            if scene.video_url().is_none() {
                return Err(format!("videos[{}].final_video_url is required", index));
            }
        }
        resolve_options(&self.overlay_options).map(|_| ())
    }

    pub fn audio_url(&self) -> Option<&str> {
        present(&self.mv_audio)
    }

    pub fn overlay_url(&self) -> Option<&str> {
        present(&self.overlay_image_url)
    }

    pub fn overlay_options(&self) -> Result<OverlayOptions, String> {
        resolve_options(&self.overlay_options)
    }
}
