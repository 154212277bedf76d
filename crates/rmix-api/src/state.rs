//! Application state.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rmix_models::{artifact_file_name, ArtifactKind, JobId};
use rmix_worker::{JobOrchestrator, JobRegistry, WorkerConfig, WorkerResult};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub orchestrator: Arc<JobOrchestrator>,
    pub registry: JobRegistry,
}

impl AppState {
    /// Create new application state.
    pub fn new(config: ApiConfig, worker: WorkerConfig) -> WorkerResult<Self> {
        let registry = JobRegistry::new(worker.job_retention);
        let orchestrator = JobOrchestrator::new(worker, registry.clone())?;
        Ok(Self {
            config,
            orchestrator: Arc::new(orchestrator),
            registry,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.orchestrator.config().output_dir
    }

    /// Expected location of a job's artifact.
    pub fn artifact_path(&self, kind: ArtifactKind, job_id: &JobId) -> PathBuf {
        self.output_dir().join(artifact_file_name(kind, job_id))
    }
}
