//! Job orchestrator.
//!
//! Runs one job end to end: working directory, fetch, probe, transform,
//! finalize, cleanup. Stages run strictly in order because each consumes the
//! previous stage's output file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument;

use rmix_media::{
    compose_video, concat_videos, fs_utils, overlay_image, trim_audio, validate_url, AssetFetcher,
    FfmpegRunner, MediaProbe, TransformInvocation,
};
use rmix_models::{
    artifact_file_name, AddImageOverlayRequest, AddOverlayRequest, ArtifactKind, Asset, AssetKind,
    JobId, JobStage, JobVariant, OverlayOptions, StitchVideosRequest,
};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::registry::JobRegistry;
use crate::scenes::{order_scenes, SceneOrder};
use crate::workspace::JobWorkspace;

/// Overlay image URL together with its placement.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlaySource {
    pub url: String,
    pub options: OverlayOptions,
}

/// A validated job request.
///
/// Built from the HTTP bodies with `TryFrom`; every failure there is a
/// [`WorkerError::Validation`] raised before any filesystem work.
#[derive(Debug, Clone)]
pub enum JobRequest {
    Single {
        video_url: String,
        music_url: String,
        overlay: Option<OverlaySource>,
    },
    Stitch {
        order: SceneOrder,
        audio_url: String,
        overlay: Option<OverlaySource>,
    },
    ImageOverlay {
        image_url: String,
        overlay: OverlaySource,
    },
}

impl JobRequest {
    pub fn variant(&self) -> JobVariant {
        match self {
            JobRequest::Single { .. } => JobVariant::Single,
            JobRequest::Stitch { .. } => JobVariant::Stitch,
            JobRequest::ImageOverlay { .. } => JobVariant::ImageOverlay,
        }
    }
}

fn required_url(value: Option<&str>, field: &str) -> WorkerResult<String> {
    let url = value.ok_or_else(|| WorkerError::validation(format!("{} is required", field)))?;
    validate_url(url).map_err(|e| WorkerError::validation(format!("{}: {}", field, e)))?;
    Ok(url.to_string())
}

fn optional_overlay(
    url: Option<&str>,
    options: Result<OverlayOptions, String>,
) -> WorkerResult<Option<OverlaySource>> {
    let options = options.map_err(WorkerError::Validation)?;
    match url {
        Some(_) => Ok(Some(OverlaySource {
            url: required_url(url, "overlay_image_url")?,
            options,
        })),
        None => Ok(None),
    }
}

impl TryFrom<&AddOverlayRequest> for JobRequest {
    type Error = WorkerError;

    fn try_from(req: &AddOverlayRequest) -> WorkerResult<Self> {
        req.validate().map_err(WorkerError::Validation)?;
        Ok(JobRequest::Single {
            video_url: required_url(req.video_url(), "final_stitch_video")?,
            music_url: required_url(req.music_url(), "final_music_url")?,
            overlay: optional_overlay(req.overlay_url(), req.overlay_options())?,
        })
    }
}

impl TryFrom<&StitchVideosRequest> for JobRequest {
    type Error = WorkerError;

    fn try_from(req: &StitchVideosRequest) -> WorkerResult<Self> {
        req.validate().map_err(WorkerError::Validation)?;
        let order = order_scenes(&req.videos)?;
        for (index, scene) in order.scenes.iter().enumerate() {
            validate_url(&scene.video_url).map_err(|e| {
                WorkerError::validation(format!("scene {} ({}): {}", scene.scene_number, index, e))
            })?;
        }
        Ok(JobRequest::Stitch {
            order,
            audio_url: required_url(req.audio_url(), "mv_audio")?,
            overlay: optional_overlay(req.overlay_url(), req.overlay_options())?,
        })
    }
}

impl TryFrom<&AddImageOverlayRequest> for JobRequest {
    type Error = WorkerError;

    fn try_from(req: &AddImageOverlayRequest) -> WorkerResult<Self> {
        req.validate().map_err(WorkerError::Validation)?;
        let options = req.overlay_options().map_err(WorkerError::Validation)?;
        Ok(JobRequest::ImageOverlay {
            image_url: required_url(req.image_url(), "final_image_url")?,
            overlay: OverlaySource {
                url: required_url(req.overlay_url(), "overlay_image_url")?,
                options,
            },
        })
    }
}

/// Result of a video job.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoOutcome {
    pub artifact_path: PathBuf,
    /// Probed duration of the final artifact
    pub duration: f64,
    pub file_size: u64,
    pub overlay_applied: bool,
    /// Scene numbers in concatenation order (stitch only)
    pub scene_order: Option<Vec<i64>>,
}

/// Result of an image job.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageOutcome {
    pub artifact_path: PathBuf,
    pub file_size: u64,
    pub dimensions: Option<(u32, u32)>,
    /// `false` when compositing failed and the base image was delivered as-is
    pub overlay_applied: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Video(VideoOutcome),
    Image(ImageOutcome),
}

/// Sequences the pipeline stages for each job variant.
#[derive(Debug, Clone)]
pub struct JobOrchestrator {
    config: Arc<WorkerConfig>,
    fetcher: AssetFetcher,
    probe: MediaProbe,
    runner: FfmpegRunner,
    registry: JobRegistry,
}

impl JobOrchestrator {
    pub fn new(config: WorkerConfig, registry: JobRegistry) -> WorkerResult<Self> {
        let fetcher = AssetFetcher::new(config.fetch_timeout)?;
        Ok(Self {
            config: Arc::new(config),
            fetcher,
            probe: MediaProbe::new(),
            runner: FfmpegRunner::new(),
            registry,
        })
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Path of a job's durable artifact, whether or not it exists yet.
    pub fn artifact_path(&self, kind: ArtifactKind, job_id: &JobId) -> PathBuf {
        self.config.output_dir.join(artifact_file_name(kind, job_id))
    }

    /// Run a job to completion or failure.
    ///
    /// The working directory is removed before this returns, on every path.
    pub async fn run(&self, job_id: &JobId, request: JobRequest) -> WorkerResult<JobOutcome> {
        let variant = request.variant();
        let logger = JobLogger::new(job_id, variant);
        let span = logger.create_span();
        let started = Instant::now();

        self.registry.insert(job_id, variant).await;
        metrics::counter!("rmix_jobs_started_total", "variant" => variant.as_str()).increment(1);

        let result = async {
            logger.log_start("accepted");
            let workspace = JobWorkspace::create(&self.config.temp_dir, job_id).await?;
            let result = match request {
                JobRequest::Single {
                    video_url,
                    music_url,
                    overlay,
                } => self
                    .run_single(job_id, &workspace, &logger, &video_url, &music_url, overlay.as_ref())
                    .await
                    .map(JobOutcome::Video),
                JobRequest::Stitch {
                    order,
                    audio_url,
                    overlay,
                } => self
                    .run_stitch(job_id, &workspace, &logger, &order, &audio_url, overlay.as_ref())
                    .await
                    .map(JobOutcome::Video),
                JobRequest::ImageOverlay { image_url, overlay } => self
                    .run_image_overlay(job_id, &workspace, &logger, &image_url, &overlay)
                    .await
                    .map(JobOutcome::Image),
            };
            workspace.cleanup().await;
            result
        }
        .instrument(span)
        .await;

        let elapsed = started.elapsed().as_secs_f64();
        match &result {
            Ok(_) => {
                self.registry.complete(job_id).await;
                metrics::counter!("rmix_jobs_completed_total", "variant" => variant.as_str())
                    .increment(1);
                metrics::histogram!("rmix_job_duration_seconds", "variant" => variant.as_str())
                    .record(elapsed);
                logger.log_completion(&format!("finished in {:.1}s", elapsed));
            }
            Err(e) => {
                self.registry.fail(job_id, e.to_string()).await;
                metrics::counter!(
                    "rmix_jobs_failed_total",
                    "variant" => variant.as_str(),
                    "kind" => e.kind()
                )
                .increment(1);
                logger.log_error(&e.to_string());
            }
        }
        result
    }

    async fn stage(&self, job_id: &JobId, stage: JobStage) {
        self.registry.advance(job_id, stage).await;
    }

    async fn fetch(&self, asset: &Asset) -> WorkerResult<()> {
        let start = Instant::now();
        let result = self.fetcher.fetch_asset(asset).await;
        metrics::histogram!("rmix_fetch_duration_seconds", "kind" => asset.kind.as_str())
            .record(start.elapsed().as_secs_f64());
        result.map(|_| ()).map_err(WorkerError::from)
    }

    async fn transform(&self, invocation: TransformInvocation) -> WorkerResult<()> {
        self.runner.run(&invocation).await.map_err(WorkerError::from)
    }

    /// Fetch the optional overlay image into the workspace.
    async fn fetch_overlay(
        &self,
        workspace: &JobWorkspace,
        overlay: Option<&OverlaySource>,
    ) -> WorkerResult<Option<(PathBuf, OverlayOptions)>> {
        match overlay {
            Some(source) => {
                let asset = Asset::new(
                    AssetKind::OverlayImage,
                    &source.url,
                    workspace.asset_path(AssetKind::OverlayImage, 0),
                );
                self.fetch(&asset).await?;
                Ok(Some((asset.local_path, source.options)))
            }
            None => Ok(None),
        }
    }

    /// Trim `music` to `duration`, then replace `video`'s audio with it and
    /// apply the optional overlay. Returns the composed file.
    async fn trim_and_compose(
        &self,
        workspace: &JobWorkspace,
        video: &Path,
        music: &Path,
        duration: f64,
        overlay: Option<&(PathBuf, OverlayOptions)>,
    ) -> WorkerResult<PathBuf> {
        let options = self.config.compose_options();

        let trimmed = workspace.file("trimmed_audio.m4a");
        self.transform(
            TransformInvocation::new([music.to_path_buf()], &trimmed, trim_audio(duration, &options))
                .with_label("trim"),
        )
        .await?;

        let mut inputs = vec![video.to_path_buf(), trimmed];
        if let Some((path, _)) = overlay {
            inputs.push(path.clone());
        }
        let composed = workspace.file("composed.mp4");
        let spec = compose_video(overlay.map(|(_, o)| o), &options);
        self.transform(TransformInvocation::new(inputs, &composed, spec).with_label("compose"))
            .await?;

        Ok(composed)
    }

    async fn run_single(
        &self,
        job_id: &JobId,
        workspace: &JobWorkspace,
        logger: &JobLogger,
        video_url: &str,
        music_url: &str,
        overlay: Option<&OverlaySource>,
    ) -> WorkerResult<VideoOutcome> {
        self.stage(job_id, JobStage::Fetching).await;
        let video = Asset::new(AssetKind::Video, video_url, workspace.asset_path(AssetKind::Video, 0));
        let music = Asset::new(AssetKind::Audio, music_url, workspace.asset_path(AssetKind::Audio, 0));
        self.fetch(&video).await?;
        self.fetch(&music).await?;
        let overlay = self.fetch_overlay(workspace, overlay).await?;
        logger.log_progress("assets fetched");

        self.stage(job_id, JobStage::Probing).await;
        let duration = self.probe.duration(&video.local_path).await?;
        logger.log_progress(&format!("video duration {:.3}s", duration));

        self.stage(job_id, JobStage::Transforming).await;
        let composed = self
            .trim_and_compose(workspace, &video.local_path, &music.local_path, duration, overlay.as_ref())
            .await?;

        self.finalize_video(job_id, &composed, overlay.is_some(), None).await
    }

    async fn run_stitch(
        &self,
        job_id: &JobId,
        workspace: &JobWorkspace,
        logger: &JobLogger,
        order: &SceneOrder,
        audio_url: &str,
        overlay: Option<&OverlaySource>,
    ) -> WorkerResult<VideoOutcome> {
        for dup in &order.dropped {
            logger.log_warning(&format!(
                "duplicate scene_number {} ignored ({})",
                dup.scene_number, dup.video_url
            ));
        }

        self.stage(job_id, JobStage::Fetching).await;
        let music = Asset::new(AssetKind::Audio, audio_url, workspace.asset_path(AssetKind::Audio, 0));
        self.fetch(&music).await?;
        let overlay = self.fetch_overlay(workspace, overlay).await?;

        let mut clips = Vec::with_capacity(order.scenes.len());
        for (index, scene) in order.scenes.iter().enumerate() {
            let clip = Asset::new(
                AssetKind::Video,
                &scene.video_url,
                workspace.asset_path(AssetKind::Video, index),
            );
            self.fetch(&clip).await?;
            clips.push(clip.local_path);
        }
        logger.log_progress(&format!("fetched {} scenes", clips.len()));

        self.stage(job_id, JobStage::Transforming).await;
        let stitched = workspace.file("stitched.mp4");
        let spec = concat_videos(clips.len(), &self.config.compose_options());
        self.transform(TransformInvocation::new(clips, &stitched, spec).with_label("concat"))
            .await?;

        self.stage(job_id, JobStage::Probing).await;
        let duration = self.probe.duration(&stitched).await?;
        logger.log_progress(&format!("stitched duration {:.3}s", duration));

        self.stage(job_id, JobStage::Transforming).await;
        let composed = self
            .trim_and_compose(workspace, &stitched, &music.local_path, duration, overlay.as_ref())
            .await?;

        self.finalize_video(job_id, &composed, overlay.is_some(), Some(order.numbers()))
            .await
    }

    async fn run_image_overlay(
        &self,
        job_id: &JobId,
        workspace: &JobWorkspace,
        logger: &JobLogger,
        image_url: &str,
        overlay: &OverlaySource,
    ) -> WorkerResult<ImageOutcome> {
        self.stage(job_id, JobStage::Fetching).await;
        let base = Asset::new(
            AssetKind::BaseImage,
            image_url,
            workspace.asset_path(AssetKind::BaseImage, 0),
        );
        self.fetch(&base).await?;
        let overlay_asset = Asset::new(
            AssetKind::OverlayImage,
            &overlay.url,
            workspace.asset_path(AssetKind::OverlayImage, 0),
        );
        self.fetch(&overlay_asset).await?;

        self.stage(job_id, JobStage::Transforming).await;
        let composited = workspace.file("composited.png");
        let invocation = TransformInvocation::new(
            [base.local_path.clone(), overlay_asset.local_path.clone()],
            &composited,
            overlay_image(&overlay.options),
        )
        .with_label("overlay_image");

        let overlay_applied = match self.runner.run(&invocation).await {
            Ok(()) => true,
            Err(e) => {
                logger.log_warning(&format!("compositing failed, delivering base image: {}", e));
                metrics::counter!("rmix_image_overlay_fallbacks_total").increment(1);
                fs_utils::copy_file(&base.local_path, &composited).await?;
                false
            }
        };

        self.stage(job_id, JobStage::Finalizing).await;
        let artifact = self.artifact_path(ArtifactKind::Image, job_id);
        fs_utils::move_file(&composited, &artifact).await?;
        let file_size = tokio::fs::metadata(&artifact).await?.len();
        let dimensions = self.probe.dimensions(&artifact).await.ok();

        Ok(ImageOutcome {
            artifact_path: artifact,
            file_size,
            dimensions,
            overlay_applied,
        })
    }

    /// Move the composed video into the output root and collect its stats.
    async fn finalize_video(
        &self,
        job_id: &JobId,
        composed: &Path,
        overlay_applied: bool,
        scene_order: Option<Vec<i64>>,
    ) -> WorkerResult<VideoOutcome> {
        self.stage(job_id, JobStage::Finalizing).await;
        let duration = self.probe.duration(composed).await?;
        let artifact = self.artifact_path(ArtifactKind::Video, job_id);
        fs_utils::move_file(composed, &artifact).await?;
        let file_size = tokio::fs::metadata(&artifact).await?.len();

        Ok(VideoOutcome {
            artifact_path: artifact,
            duration,
            file_size,
            overlay_applied,
            scene_order,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmix_models::{OverlayOptionsInput, OverlayPosition, SceneInput, SceneNumber};
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn orchestrator(root: &TempDir) -> JobOrchestrator {
        let config = WorkerConfig {
            output_dir: root.path().join("output"),
            temp_dir: root.path().join("temp"),
            ..Default::default()
        };
        JobOrchestrator::new(config, JobRegistry::new(std::time::Duration::from_secs(60))).unwrap()
    }

    #[test]
    fn test_single_request_validation() {
        let missing = AddOverlayRequest {
            final_stitch_video: Some("https://cdn.example.com/v.mp4".into()),
            ..Default::default()
        };
        let err = JobRequest::try_from(&missing).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("final_music_url"));

        let bad_scheme = AddOverlayRequest {
            final_stitch_video: Some("file:///etc/passwd".into()),
            final_music_url: Some("https://cdn.example.com/m.mp3".into()),
            ..Default::default()
        };
        assert!(JobRequest::try_from(&bad_scheme).unwrap_err().is_validation());
    }

    #[test]
    fn test_single_request_overlay_defaults() {
        let req = AddOverlayRequest {
            final_stitch_video: Some("https://cdn.example.com/v.mp4".into()),
            final_music_url: Some("https://cdn.example.com/m.mp3".into()),
            overlay_image_url: Some("https://cdn.example.com/logo.png".into()),
            overlay_options: Some(OverlayOptionsInput {
                position: Some("top-left".into()),
                ..Default::default()
            }),
        };
        match JobRequest::try_from(&req).unwrap() {
            JobRequest::Single { overlay: Some(overlay), .. } => {
                assert_eq!(overlay.options.position, OverlayPosition::TopLeft);
                assert_eq!(overlay.options.size, 150);
                assert_eq!(overlay.options.margin, 20);
            }
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[test]
    fn test_stitch_request_orders_scenes() {
        let scene = |n: i64, url: &str| SceneInput {
            scene_number: Some(SceneNumber::Integer(n)),
            final_video_url: Some(url.to_string()),
        };
        let req = StitchVideosRequest {
            videos: vec![
                scene(3, "https://cdn.example.com/c.mp4"),
                scene(1, "https://cdn.example.com/a.mp4"),
                scene(2, "https://cdn.example.com/b.mp4"),
            ],
            mv_audio: Some("https://cdn.example.com/m.mp3".into()),
            ..Default::default()
        };
        let request = JobRequest::try_from(&req).unwrap();
        assert_eq!(request.variant(), JobVariant::Stitch);
        match request {
            JobRequest::Stitch { order, overlay, .. } => {
                assert_eq!(order.numbers(), vec![1, 2, 3]);
                assert!(order.scenes[0].video_url.ends_with("a.mp4"));
                assert!(overlay.is_none());
            }
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_failure_cleans_up() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let root = TempDir::new().unwrap();
        let orchestrator = orchestrator(&root);
        let job_id = JobId::from_string("job-fetch-fails");
        let request = JobRequest::Single {
            video_url: format!("{}/missing.mp4", server.uri()),
            music_url: format!("{}/missing.mp3", server.uri()),
            overlay: None,
        };

        let err = orchestrator.run(&job_id, request).await.unwrap_err();

        assert_eq!(err.kind(), "fetch");
        assert!(!root.path().join("temp").join(job_id.as_str()).exists());
        assert!(!orchestrator.artifact_path(ArtifactKind::Video, &job_id).exists());

        let record = orchestrator.registry().get(&job_id).await.unwrap();
        assert_eq!(record.stage, JobStage::Failed);
        assert!(record.error.is_some());
    }

    #[tokio::test]
    async fn test_image_overlay_falls_back_to_base() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/base.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"not really an image".to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/logo.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"nor is this".to_vec()))
            .mount(&server)
            .await;

        let root = TempDir::new().unwrap();
        let orchestrator = orchestrator(&root);
        let job_id = JobId::from_string("job-image-fallback");
        let request = JobRequest::ImageOverlay {
            image_url: format!("{}/base.jpg", server.uri()),
            overlay: OverlaySource {
                url: format!("{}/logo.png", server.uri()),
                options: OverlayOptions::default(),
            },
        };

        let outcome = orchestrator.run(&job_id, request).await.unwrap();

        match outcome {
            JobOutcome::Image(image) => {
                assert!(!image.overlay_applied);
                assert_eq!(image.file_size, 19);
                assert!(image.artifact_path.ends_with("final_image_job-image-fallback.png"));
                assert_eq!(
                    std::fs::read(&image.artifact_path).unwrap(),
                    b"not really an image"
                );
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(!root.path().join("temp").join(job_id.as_str()).exists());
        let record = orchestrator.registry().get(&job_id).await.unwrap();
        assert_eq!(record.stage, JobStage::Completed);
    }

    #[tokio::test]
    async fn test_image_overlay_fetch_failure_fails_job() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/base.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"base".to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/logo.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let root = TempDir::new().unwrap();
        let orchestrator = orchestrator(&root);
        let job_id = JobId::from_string("job-overlay-missing");
        let request = JobRequest::ImageOverlay {
            image_url: format!("{}/base.jpg", server.uri()),
            overlay: OverlaySource {
                url: format!("{}/logo.png", server.uri()),
                options: OverlayOptions::default(),
            },
        };

        let err = orchestrator.run(&job_id, request).await.unwrap_err();

        assert_eq!(err.kind(), "fetch");
        assert!(!orchestrator.artifact_path(ArtifactKind::Image, &job_id).exists());
        let record = orchestrator.registry().get(&job_id).await.unwrap();
        assert_eq!(record.stage, JobStage::Failed);
    }
}
