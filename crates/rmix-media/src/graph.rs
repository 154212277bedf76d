//! Declarative filter-graph value.
//!
//! A [`FilterGraphSpec`] is an ordered list of labelled processing nodes plus
//! the output mapping and codec directives. It is built by the pure functions
//! in [`crate::filters`] and only turned into FFmpeg's textual syntax by the
//! executor in [`crate::command`].

use std::collections::HashSet;
use std::fmt;

/// Elementary stream type of a pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Video,
    Audio,
}

impl StreamKind {
    fn specifier(&self) -> &'static str {
        match self {
            StreamKind::Video => "v",
            StreamKind::Audio => "a",
        }
    }
}

/// A connection point: either a stream of a numbered input file or the
/// labelled output of an earlier node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Pad {
    Input { index: usize, kind: StreamKind },
    Label(String),
}

impl Pad {
    pub fn video(index: usize) -> Self {
        Pad::Input {
            index,
            kind: StreamKind::Video,
        }
    }

    pub fn audio(index: usize) -> Self {
        Pad::Input {
            index,
            kind: StreamKind::Audio,
        }
    }

    pub fn label(name: impl Into<String>) -> Self {
        Pad::Label(name.into())
    }

    /// Argument for `-map`: the first stream of that kind, or a node output.
    pub fn map_arg(&self) -> String {
        match self {
            Pad::Input { index, kind } => format!("{}:{}:0", index, kind.specifier()),
            Pad::Label(name) => format!("[{}]", name),
        }
    }
}

impl fmt::Display for Pad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pad::Input { index, kind } => write!(f, "[{}:{}]", index, kind.specifier()),
            Pad::Label(name) => write!(f, "[{}]", name),
        }
    }
}

/// One overlay coordinate, relative to the main frame (`W`/`H`) and the
/// overlay (`w`/`h`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coord {
    /// Fixed distance from the left or top edge
    Offset(u32),
    /// `W-w-margin`
    FromRight(u32),
    /// `H-h-margin`
    FromBottom(u32),
}

impl Coord {
    /// Evaluate against concrete frame and overlay extents along this axis.
    pub fn resolve(&self, frame_extent: i64, overlay_extent: i64) -> i64 {
        match *self {
            Coord::Offset(margin) => margin as i64,
            Coord::FromRight(margin) | Coord::FromBottom(margin) => {
                frame_extent - overlay_extent - margin as i64
            }
        }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coord::Offset(margin) => write!(f, "{}", margin),
            Coord::FromRight(margin) => write!(f, "W-w-{}", margin),
            Coord::FromBottom(margin) => write!(f, "H-h-{}", margin),
        }
    }
}

/// Operation performed by a node.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    /// Scale to `width`; `height: None` keeps the aspect ratio
    Scale { width: u32, height: Option<u32> },
    /// Composite the second input onto the first
    Overlay { x: Coord, y: Coord },
    /// Join `segments` inputs end to end
    Concat {
        segments: usize,
        video: usize,
        audio: usize,
    },
    Volume { gain: f64 },
    Format { pixel_format: String },
    /// Keep `duration` seconds of audio starting at `start`
    AudioTrim { start: f64, duration: f64 },
    /// Restart audio timestamps at zero
    AudioResetPts,
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterOp::Scale { width, height } => match height {
                Some(h) => write!(f, "scale={}:{}", width, h),
                None => write!(f, "scale={}:-1", width),
            },
            FilterOp::Overlay { x, y } => write!(f, "overlay={}:{}", x, y),
            FilterOp::Concat {
                segments,
                video,
                audio,
            } => write!(f, "concat=n={}:v={}:a={}", segments, video, audio),
            FilterOp::Volume { gain } => write!(f, "volume={:.3}", gain),
            FilterOp::Format { pixel_format } => write!(f, "format={}", pixel_format),
            FilterOp::AudioTrim { start, duration } => {
                write!(f, "atrim=start={:.3}:duration={:.3}", start, duration)
            }
            FilterOp::AudioResetPts => f.write_str("asetpts=PTS-STARTPTS"),
        }
    }
}

/// A processing node with named input pads and one labelled output.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterNode {
    pub inputs: Vec<Pad>,
    pub op: FilterOp,
    pub output: String,
}

impl FilterNode {
    pub fn new(inputs: Vec<Pad>, op: FilterOp, output: impl Into<String>) -> Self {
        Self {
            inputs,
            op,
            output: output.into(),
        }
    }
}

impl fmt::Display for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for pad in &self.inputs {
            write!(f, "{}", pad)?;
        }
        write!(f, "{}[{}]", self.op, self.output)
    }
}

/// Re-encode settings for video outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoEncoding {
    pub codec: String,
    pub preset: String,
    pub crf: u8,
}

impl Default for VideoEncoding {
    fn default() -> Self {
        Self {
            codec: "libx264".to_string(),
            preset: "fast".to_string(),
            crf: 23,
        }
    }
}

/// Per-stream codec directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputCodec {
    /// Stream copy, no re-encode
    Copy,
    Encode { codec: String, args: Vec<String> },
}

impl OutputCodec {
    pub fn encode(codec: impl Into<String>) -> Self {
        OutputCodec::Encode {
            codec: codec.into(),
            args: Vec::new(),
        }
    }

    pub fn audio(codec: impl Into<String>, bitrate: impl Into<String>) -> Self {
        OutputCodec::Encode {
            codec: codec.into(),
            args: vec!["-b:a".to_string(), bitrate.into()],
        }
    }

    pub fn video(encoding: &VideoEncoding) -> Self {
        OutputCodec::Encode {
            codec: encoding.codec.clone(),
            args: vec![
                "-preset".to_string(),
                encoding.preset.clone(),
                "-crf".to_string(),
                encoding.crf.to_string(),
            ],
        }
    }

    pub fn is_copy(&self) -> bool {
        matches!(self, OutputCodec::Copy)
    }
}

/// Complete description of one transform: nodes, output mapping and codecs.
///
/// Built once with the consuming `with_*` methods and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterGraphSpec {
    nodes: Vec<FilterNode>,
    maps: Vec<Pad>,
    video_codec: Option<OutputCodec>,
    audio_codec: Option<OutputCodec>,
    drop_audio: bool,
    shortest: bool,
    max_video_frames: Option<u32>,
    faststart: bool,
}

impl FilterGraphSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node(mut self, node: FilterNode) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn with_map(mut self, pad: Pad) -> Self {
        self.maps.push(pad);
        self
    }

    pub fn with_video_codec(mut self, codec: OutputCodec) -> Self {
        self.video_codec = Some(codec);
        self
    }

    pub fn with_audio_codec(mut self, codec: OutputCodec) -> Self {
        self.audio_codec = Some(codec);
        self
    }

    /// Emit no audio stream.
    pub fn without_audio(mut self) -> Self {
        self.drop_audio = true;
        self
    }

    /// Stop at the end of the shortest mapped stream.
    pub fn with_shortest(mut self) -> Self {
        self.shortest = true;
        self
    }

    pub fn with_max_video_frames(mut self, frames: u32) -> Self {
        self.max_video_frames = Some(frames);
        self
    }

    /// Move the MP4 index to the front for progressive playback.
    pub fn with_faststart(mut self) -> Self {
        self.faststart = true;
        self
    }

    pub fn nodes(&self) -> &[FilterNode] {
        &self.nodes
    }

    pub fn maps(&self) -> &[Pad] {
        &self.maps
    }

    pub fn video_codec(&self) -> Option<&OutputCodec> {
        self.video_codec.as_ref()
    }

    pub fn audio_codec(&self) -> Option<&OutputCodec> {
        self.audio_codec.as_ref()
    }

    pub fn drops_audio(&self) -> bool {
        self.drop_audio
    }

    pub fn is_shortest(&self) -> bool {
        self.shortest
    }

    pub fn max_video_frames(&self) -> Option<u32> {
        self.max_video_frames
    }

    pub fn is_faststart(&self) -> bool {
        self.faststart
    }

    /// Find the node producing `label`.
    pub fn node(&self, label: &str) -> Option<&FilterNode> {
        self.nodes.iter().find(|n| n.output == label)
    }

    /// Check that every label is defined once, before it is consumed, and
    /// that every mapped label exists.
    pub fn validate(&self) -> Result<(), String> {
        let mut defined: HashSet<&str> = HashSet::new();
        for node in &self.nodes {
            for pad in &node.inputs {
                if let Pad::Label(name) = pad {
                    if !defined.contains(name.as_str()) {
                        return Err(format!("pad [{}] used before it is defined", name));
                    }
                }
            }
            if !defined.insert(node.output.as_str()) {
                return Err(format!("pad [{}] defined twice", node.output));
            }
        }
        for pad in &self.maps {
            if let Pad::Label(name) = pad {
                if !defined.contains(name.as_str()) {
                    return Err(format!("mapped pad [{}] is not defined", name));
                }
            }
        }
        Ok(())
    }

    /// FFmpeg `-filter_complex` text, or `None` when the graph has no nodes.
    pub fn filter_complex(&self) -> Option<String> {
        if self.nodes.is_empty() {
            return None;
        }
        Some(
            self.nodes
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(";"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_rendering() {
        let node = FilterNode::new(
            vec![Pad::video(0), Pad::label("ovr")],
            FilterOp::Overlay {
                x: Coord::FromRight(20),
                y: Coord::FromBottom(20),
            },
            "vout",
        );
        assert_eq!(node.to_string(), "[0:v][ovr]overlay=W-w-20:H-h-20[vout]");
    }

    #[test]
    fn test_op_rendering() {
        assert_eq!(FilterOp::Scale { width: 150, height: None }.to_string(), "scale=150:-1");
        assert_eq!(
            FilterOp::Concat { segments: 3, video: 1, audio: 0 }.to_string(),
            "concat=n=3:v=1:a=0"
        );
        assert_eq!(
            FilterOp::AudioTrim { start: 0.0, duration: 12.3456 }.to_string(),
            "atrim=start=0.000:duration=12.346"
        );
        assert_eq!(FilterOp::Volume { gain: 0.5 }.to_string(), "volume=0.500");
    }

    #[test]
    fn test_map_args() {
        assert_eq!(Pad::audio(1).map_arg(), "1:a:0");
        assert_eq!(Pad::label("vout").map_arg(), "[vout]");
    }

    #[test]
    fn test_coord_resolution() {
        assert_eq!(Coord::Offset(20).resolve(1920, 150), 20);
        assert_eq!(Coord::FromRight(20).resolve(1920, 150), 1750);
    }

    #[test]
    fn test_validate_rejects_dangling_labels() {
        let spec = FilterGraphSpec::new().with_node(FilterNode::new(
            vec![Pad::label("missing")],
            FilterOp::AudioResetPts,
            "aout",
        ));
        assert!(spec.validate().is_err());

        let spec = FilterGraphSpec::new().with_map(Pad::label("nowhere"));
        assert!(spec.validate().is_err());

        let spec = FilterGraphSpec::new()
            .with_node(FilterNode::new(vec![Pad::audio(0)], FilterOp::AudioResetPts, "aout"))
            .with_map(Pad::label("aout"));
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_empty_graph_has_no_filter_complex() {
        assert!(FilterGraphSpec::new().filter_complex().is_none());
    }
}
