//! FFmpeg invocation and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};
use crate::graph::{FilterGraphSpec, OutputCodec};

/// Maximum number of stderr bytes kept in an error.
const STDERR_TAIL_BYTES: usize = 4096;

/// One engine run: ordered input files, a graph and the output path.
#[derive(Debug, Clone)]
pub struct TransformInvocation {
    inputs: Vec<PathBuf>,
    output: PathBuf,
    spec: FilterGraphSpec,
    /// Operation name used in logs and metrics
    label: &'static str,
}

impl TransformInvocation {
    pub fn new(
        inputs: impl IntoIterator<Item = PathBuf>,
        output: impl AsRef<Path>,
        spec: FilterGraphSpec,
    ) -> Self {
        Self {
            inputs: inputs.into_iter().collect(),
            output: output.as_ref().to_path_buf(),
            spec,
            label: "transform",
        }
    }

    pub fn with_label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn spec(&self) -> &FilterGraphSpec {
        &self.spec
    }

    /// Serialize into FFmpeg arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-v".to_string(),
            "error".to_string(),
        ];

        for input in &self.inputs {
            args.push("-i".to_string());
            args.push(input.to_string_lossy().to_string());
        }

        if let Some(graph) = self.spec.filter_complex() {
            args.push("-filter_complex".to_string());
            args.push(graph);
        }

        for pad in self.spec.maps() {
            args.push("-map".to_string());
            args.push(pad.map_arg());
        }

        if let Some(codec) = self.spec.video_codec() {
            push_codec(&mut args, "-c:v", codec);
        }
        if self.spec.drops_audio() {
            args.push("-an".to_string());
        } else if let Some(codec) = self.spec.audio_codec() {
            push_codec(&mut args, "-c:a", codec);
        }

        if self.spec.is_shortest() {
            args.push("-shortest".to_string());
        }
        if let Some(frames) = self.spec.max_video_frames() {
            args.push("-frames:v".to_string());
            args.push(frames.to_string());
        }
        if self.spec.is_faststart() {
            args.push("-movflags".to_string());
            args.push("+faststart".to_string());
        }

        args.push(self.output.to_string_lossy().to_string());
        args
    }
}

fn push_codec(args: &mut Vec<String>, flag: &str, codec: &OutputCodec) {
    args.push(flag.to_string());
    match codec {
        OutputCodec::Copy => args.push("copy".to_string()),
        OutputCodec::Encode { codec, args: extra } => {
            args.push(codec.clone());
            args.extend(extra.iter().cloned());
        }
    }
}

/// Runs [`TransformInvocation`]s through the `ffmpeg` binary.
#[derive(Debug, Clone, Default)]
pub struct FfmpegRunner {
    timeout: Option<Duration>,
}

impl FfmpegRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill the engine if a single run exceeds `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run the invocation to completion.
    ///
    /// A non-zero exit becomes [`MediaError::FfmpegFailed`] carrying the tail
    /// of stderr. The output file is also required to exist afterwards.
    pub async fn run(&self, invocation: &TransformInvocation) -> MediaResult<()> {
        check_ffmpeg()?;

        invocation
            .spec()
            .validate()
            .map_err(|msg| MediaError::ffmpeg_failed(format!("invalid filter graph: {}", msg), None, None))?;

        let args = invocation.build_args();
        debug!(op = invocation.label(), "Running FFmpeg: ffmpeg {}", args.join(" "));

        let start = Instant::now();
        let child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child).await {
                Ok(result) => result?,
                Err(_) => {
                    warn!(op = invocation.label(), "FFmpeg timed out after {:?}", limit);
                    return Err(MediaError::ffmpeg_failed(
                        format!("timed out after {} seconds", limit.as_secs()),
                        None,
                        None,
                    ));
                }
            },
            None => child.await?,
        };

        metrics::histogram!(
            "rmix_transform_duration_seconds",
            "op" => invocation.label()
        )
        .record(start.elapsed().as_secs_f64());

        if !output.status.success() {
            let stderr = stderr_tail(&output.stderr);
            warn!(
                op = invocation.label(),
                exit_code = ?output.status.code(),
                "FFmpeg failed: {}",
                stderr
            );
            return Err(MediaError::ffmpeg_failed(
                format!("{} exited with non-zero status", invocation.label()),
                Some(stderr),
                output.status.code(),
            ));
        }

        if !tokio::fs::try_exists(invocation.output()).await.unwrap_or(false) {
            return Err(MediaError::ffmpeg_failed(
                format!("{} produced no output file", invocation.label()),
                None,
                output.status.code(),
            ));
        }

        Ok(())
    }
}

/// Last few KiB of stderr, lossily decoded.
fn stderr_tail(stderr: &[u8]) -> String {
    let start = stderr.len().saturating_sub(STDERR_TAIL_BYTES);
    String::from_utf8_lossy(&stderr[start..]).trim().to_string()
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{compose_video, concat_videos, overlay_image, ComposeOptions};
    use rmix_models::OverlayOptions;

    fn position(args: &[String], needle: &str) -> usize {
        args.iter().position(|a| a == needle).unwrap()
    }

    #[test]
    fn test_compose_copy_args() {
        let inv = TransformInvocation::new(
            vec![PathBuf::from("video.mp4"), PathBuf::from("music.m4a")],
            "out.mp4",
            compose_video(None, &ComposeOptions::default()),
        );
        let args = inv.build_args();

        assert_eq!(&args[..4], &["-y", "-hide_banner", "-v", "error"]);
        assert!(!args.contains(&"-filter_complex".to_string()));
        assert_eq!(args[position(&args, "-c:v") + 1], "copy");
        assert_eq!(args[position(&args, "-c:a") + 1], "aac");
        assert!(args.contains(&"0:v:0".to_string()));
        assert!(args.contains(&"1:a:0".to_string()));
        assert!(args.contains(&"-shortest".to_string()));
        assert_eq!(args.last().unwrap(), "out.mp4");
    }

    #[test]
    fn test_inputs_keep_order() {
        let inputs: Vec<PathBuf> = ["c.mp4", "a.mp4", "b.mp4"].into_iter().map(PathBuf::from).collect();
        let inv = TransformInvocation::new(inputs, "joined.mp4", concat_videos(3, &ComposeOptions::default()));
        let args = inv.build_args();

        let files: Vec<&String> = args
            .iter()
            .enumerate()
            .filter(|(i, _)| *i > 0 && args[i - 1] == "-i")
            .map(|(_, a)| a)
            .collect();
        assert_eq!(files, vec!["c.mp4", "a.mp4", "b.mp4"]);
        assert!(args.contains(&"-an".to_string()));
        assert!(!args.contains(&"-c:a".to_string()));
        assert_eq!(args[position(&args, "-map") + 1], "[vout]");
    }

    #[test]
    fn test_image_overlay_single_frame() {
        let inv = TransformInvocation::new(
            vec![PathBuf::from("base.png"), PathBuf::from("logo.png")],
            "final.png",
            overlay_image(&OverlayOptions::default()),
        );
        let args = inv.build_args();
        assert_eq!(args[position(&args, "-frames:v") + 1], "1");
        assert!(!args.contains(&"-c:v".to_string()));
    }

    #[test]
    fn test_stderr_tail_truncates() {
        let long = vec![b'x'; STDERR_TAIL_BYTES * 2];
        assert_eq!(stderr_tail(&long).len(), STDERR_TAIL_BYTES);
        assert_eq!(stderr_tail(b"  boom \n"), "boom");
    }
}
