//! Overlay placement options.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default overlay width after scaling, in pixels.
pub const DEFAULT_OVERLAY_SIZE: u32 = 150;
/// Default distance from the frame edge, in pixels.
pub const DEFAULT_OVERLAY_MARGIN: u32 = 20;

/// Corner of the frame the overlay is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OverlayPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}

impl OverlayPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverlayPosition::TopLeft => "top-left",
            OverlayPosition::TopRight => "top-right",
            OverlayPosition::BottomLeft => "bottom-left",
            OverlayPosition::BottomRight => "bottom-right",
        }
    }

    /// Whether the overlay hugs the right edge of the frame.
    pub fn is_right(&self) -> bool {
        matches!(self, OverlayPosition::TopRight | OverlayPosition::BottomRight)
    }

    /// Whether the overlay hugs the bottom edge of the frame.
    pub fn is_bottom(&self) -> bool {
        matches!(self, OverlayPosition::BottomLeft | OverlayPosition::BottomRight)
    }
}

impl FromStr for OverlayPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "top-left" => Ok(OverlayPosition::TopLeft),
            "top-right" => Ok(OverlayPosition::TopRight),
            "bottom-left" => Ok(OverlayPosition::BottomLeft),
            "bottom-right" => Ok(OverlayPosition::BottomRight),
            other => Err(format!("unknown overlay position: {}", other)),
        }
    }
}

/// Resolved overlay options for one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OverlayOptions {
    pub position: OverlayPosition,
    /// Overlay width after scaling; height follows the aspect ratio
    pub size: u32,
    /// Pixels from the anchored edges
    pub margin: u32,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            position: OverlayPosition::default(),
            size: DEFAULT_OVERLAY_SIZE,
            margin: DEFAULT_OVERLAY_MARGIN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = OverlayOptions::default();
        assert_eq!(options.position, OverlayPosition::BottomRight);
        assert_eq!(options.size, 150);
        assert_eq!(options.margin, 20);
    }

    #[test]
    fn test_position_parsing() {
        assert_eq!("top-left".parse::<OverlayPosition>().unwrap(), OverlayPosition::TopLeft);
        assert_eq!("Bottom_Left".parse::<OverlayPosition>().unwrap(), OverlayPosition::BottomLeft);
        assert!("center".parse::<OverlayPosition>().is_err());
    }

    #[test]
    fn test_position_edges() {
        assert!(OverlayPosition::TopRight.is_right());
        assert!(!OverlayPosition::TopRight.is_bottom());
        assert!(OverlayPosition::BottomLeft.is_bottom());
        assert!(!OverlayPosition::BottomLeft.is_right());
    }
}
