//! Filter-graph builders for each pipeline transform.
//!
//! Everything here is pure: the functions only describe what the engine
//! should do. Input indices follow the order in which the executor passes
//! input files.

use rmix_models::{OverlayOptions, OverlayPosition};

use crate::graph::{Coord, FilterGraphSpec, FilterNode, FilterOp, OutputCodec, Pad, VideoEncoding};

/// Pixel format the overlay output is normalised to.
pub const OUTPUT_PIXEL_FORMAT: &str = "yuv420p";

/// Encoder settings shared by the video builders.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposeOptions {
    pub video: VideoEncoding,
    pub audio_codec: String,
    pub audio_bitrate: String,
    /// Gain applied to the replacement audio; 1.0 leaves it untouched
    pub audio_gain: f64,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            video: VideoEncoding::default(),
            audio_codec: "aac".to_string(),
            audio_bitrate: "192k".to_string(),
            audio_gain: 1.0,
        }
    }
}

impl ComposeOptions {
    fn audio_output(&self) -> OutputCodec {
        OutputCodec::audio(&self.audio_codec, &self.audio_bitrate)
    }

    fn has_gain(&self) -> bool {
        (self.audio_gain - 1.0).abs() > f64::EPSILON
    }
}

/// Symbolic overlay placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: Coord,
    pub y: Coord,
    /// Overlay width after scaling
    pub overlay_width: u32,
}

impl Placement {
    /// Concrete top-left corner for a `frame_width`x`frame_height` frame and
    /// an overlay of `overlay_height` pixels after scaling.
    pub fn resolve(&self, frame_width: u32, frame_height: u32, overlay_height: u32) -> (i64, i64) {
        (
            self.x.resolve(frame_width as i64, self.overlay_width as i64),
            self.y.resolve(frame_height as i64, overlay_height as i64),
        )
    }
}

/// Place an overlay of `overlay_width` pixels in a corner, `margin` pixels from both edges.
pub fn overlay_position(position: OverlayPosition, overlay_width: u32, margin: u32) -> Placement {
    let x = if position.is_right() {
        Coord::FromRight(margin)
    } else {
        Coord::Offset(margin)
    };
    let y = if position.is_bottom() {
        Coord::FromBottom(margin)
    } else {
        Coord::Offset(margin)
    };
    Placement {
        x,
        y,
        overlay_width,
    }
}

/// Scale input `overlay_input` to the configured width and composite it onto
/// `base`, producing `output`.
fn overlay_nodes(base: Pad, overlay_input: usize, overlay: &OverlayOptions, output: &str) -> [FilterNode; 2] {
    let placement = overlay_position(overlay.position, overlay.size, overlay.margin);
    [
        FilterNode::new(
            vec![Pad::video(overlay_input)],
            FilterOp::Scale {
                width: overlay.size,
                height: None,
            },
            "ovr",
        ),
        FilterNode::new(
            vec![base, Pad::label("ovr")],
            FilterOp::Overlay {
                x: placement.x,
                y: placement.y,
            },
            output,
        ),
    ]
}

/// Single audio input (0) cut to `[0, duration)`.
///
/// A source shorter than `duration` yields its full length; nothing is padded.
pub fn trim_audio(duration: f64, options: &ComposeOptions) -> FilterGraphSpec {
    FilterGraphSpec::new()
        .with_node(FilterNode::new(
            vec![Pad::audio(0)],
            FilterOp::AudioTrim {
                start: 0.0,
                duration: duration.max(0.0),
            },
            "trimmed",
        ))
        .with_node(FilterNode::new(
            vec![Pad::label("trimmed")],
            FilterOp::AudioResetPts,
            "aout",
        ))
        .with_map(Pad::label("aout"))
        .with_audio_codec(options.audio_output())
}

/// Join `count` video inputs (0..count) in order, dropping their audio.
///
/// Inputs must share codec parameters, resolution and frame rate; the engine
/// rejects mismatched inputs at execution time.
pub fn concat_videos(count: usize, options: &ComposeOptions) -> FilterGraphSpec {
    FilterGraphSpec::new()
        .with_node(FilterNode::new(
            (0..count).map(Pad::video).collect(),
            FilterOp::Concat {
                segments: count,
                video: 1,
                audio: 0,
            },
            "vout",
        ))
        .with_map(Pad::label("vout"))
        .with_video_codec(OutputCodec::video(&options.video))
        .without_audio()
        .with_faststart()
}

/// Video input (0) with its audio replaced by input 1, optionally
/// overlaying input 2.
///
/// Without an overlay the video stream is copied untouched. Output length is
/// capped at the shorter of the video and the replacement audio.
pub fn compose_video(overlay: Option<&OverlayOptions>, options: &ComposeOptions) -> FilterGraphSpec {
    let mut spec = FilterGraphSpec::new();

    spec = match overlay {
        Some(overlay) => {
            for node in overlay_nodes(Pad::video(0), 2, overlay, "composited") {
                spec = spec.with_node(node);
            }
            spec.with_node(FilterNode::new(
                vec![Pad::label("composited")],
                FilterOp::Format {
                    pixel_format: OUTPUT_PIXEL_FORMAT.to_string(),
                },
                "vout",
            ))
            .with_map(Pad::label("vout"))
            .with_video_codec(OutputCodec::video(&options.video))
        }
        None => spec
            .with_map(Pad::video(0))
            .with_video_codec(OutputCodec::Copy),
    };

    spec = if options.has_gain() {
        spec.with_node(FilterNode::new(
            vec![Pad::audio(1)],
            FilterOp::Volume {
                gain: options.audio_gain,
            },
            "aout",
        ))
        .with_map(Pad::label("aout"))
    } else {
        spec.with_map(Pad::audio(1))
    };

    spec.with_audio_codec(options.audio_output())
        .with_shortest()
        .with_faststart()
}

/// Base image (0) with the overlay image (1) composited on top; one frame out.
pub fn overlay_image(overlay: &OverlayOptions) -> FilterGraphSpec {
    let mut spec = FilterGraphSpec::new();
    for node in overlay_nodes(Pad::video(0), 1, overlay, "out") {
        spec = spec.with_node(node);
    }
    spec.with_map(Pad::label("out")).with_max_video_frames(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_left_placement() {
        let placement = overlay_position(OverlayPosition::TopLeft, 150, 20);
        assert_eq!(placement.x, Coord::Offset(20));
        assert_eq!(placement.y, Coord::Offset(20));
        assert_eq!(placement.resolve(1920, 1080, 90), (20, 20));
    }

    #[test]
    fn test_bottom_right_placement() {
        let placement = overlay_position(OverlayPosition::BottomRight, 150, 20);
        assert_eq!(placement.x.to_string(), "W-w-20");
        assert_eq!(placement.y.to_string(), "H-h-20");
        let h = 84;
        assert_eq!(placement.resolve(1920, 1080, h), (1920 - 150 - 20, 1080 - 84 - 20));
    }

    #[test]
    fn test_mixed_corners() {
        let tr = overlay_position(OverlayPosition::TopRight, 100, 10);
        assert_eq!((tr.x.to_string(), tr.y.to_string()), ("W-w-10".to_string(), "10".to_string()));

        let bl = overlay_position(OverlayPosition::BottomLeft, 100, 10);
        assert_eq!((bl.x.to_string(), bl.y.to_string()), ("10".to_string(), "H-h-10".to_string()));
    }

    #[test]
    fn test_trim_audio_graph() {
        let spec = trim_audio(42.5, &ComposeOptions::default());
        assert_eq!(
            spec.filter_complex().unwrap(),
            "[0:a]atrim=start=0.000:duration=42.500[trimmed];[trimmed]asetpts=PTS-STARTPTS[aout]"
        );
        assert_eq!(spec.maps(), &[Pad::label("aout")]);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_trim_negative_duration_clamped() {
        let spec = trim_audio(-1.0, &ComposeOptions::default());
        assert!(spec.filter_complex().unwrap().contains("duration=0.000"));
    }

    #[test]
    fn test_concat_preserves_input_order() {
        let spec = concat_videos(3, &ComposeOptions::default());
        assert_eq!(
            spec.filter_complex().unwrap(),
            "[0:v][1:v][2:v]concat=n=3:v=1:a=0[vout]"
        );
        assert!(spec.drops_audio());
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_compose_without_overlay_copies_video() {
        let spec = compose_video(None, &ComposeOptions::default());
        assert!(spec.filter_complex().is_none());
        assert_eq!(spec.video_codec(), Some(&OutputCodec::Copy));
        assert_eq!(spec.maps(), &[Pad::video(0), Pad::audio(1)]);
        assert!(spec.is_shortest());
    }

    #[test]
    fn test_compose_with_overlay_reencodes() {
        let overlay = OverlayOptions {
            position: OverlayPosition::TopLeft,
            size: 200,
            margin: 30,
        };
        let spec = compose_video(Some(&overlay), &ComposeOptions::default());
        assert_eq!(
            spec.filter_complex().unwrap(),
            "[2:v]scale=200:-1[ovr];[0:v][ovr]overlay=30:30[composited];[composited]format=yuv420p[vout]"
        );
        assert!(!spec.video_codec().unwrap().is_copy());
        assert_eq!(spec.maps(), &[Pad::label("vout"), Pad::audio(1)]);
        assert!(spec.is_shortest());
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_compose_applies_gain() {
        let options = ComposeOptions {
            audio_gain: 0.8,
            ..Default::default()
        };
        let spec = compose_video(None, &options);
        assert_eq!(spec.filter_complex().unwrap(), "[1:a]volume=0.800[aout]");
        assert_eq!(spec.maps(), &[Pad::video(0), Pad::label("aout")]);
    }

    #[test]
    fn test_overlay_image_single_frame() {
        let spec = overlay_image(&OverlayOptions::default());
        assert_eq!(
            spec.filter_complex().unwrap(),
            "[1:v]scale=150:-1[ovr];[0:v][ovr]overlay=W-w-20:H-h-20[out]"
        );
        assert_eq!(spec.max_video_frames(), Some(1));
        assert!(spec.video_codec().is_none());
    }
}
