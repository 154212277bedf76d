//! Per-job scoped working directories.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use rmix_models::{AssetKind, JobId};

use crate::error::{WorkerError, WorkerResult};

/// Working directory owned by one job, removed when the job ends.
///
/// Call [`JobWorkspace::cleanup`] on every exit path. If the value is dropped
/// without it (panic or cancelled future) the directory is removed
/// synchronously in `Drop`.
#[derive(Debug)]
pub struct JobWorkspace {
    path: PathBuf,
    released: bool,
}

impl JobWorkspace {
    /// Create `<temp_root>/<job_id>`.
    pub async fn create(temp_root: impl AsRef<Path>, job_id: &JobId) -> WorkerResult<Self> {
        let path = temp_root.as_ref().join(job_id.as_str());
        tokio::fs::create_dir_all(&path).await.map_err(|e| {
            WorkerError::filesystem(format!(
                "cannot create working directory {}: {}",
                path.display(),
                e
            ))
        })?;
        debug!(job_id = %job_id, path = %path.display(), "Created job workspace");
        Ok(Self {
            path,
            released: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Local path for an input asset; `index` disambiguates repeated kinds.
    pub fn asset_path(&self, kind: AssetKind, index: usize) -> PathBuf {
        self.path
            .join(format!("{}_{}.{}", kind.as_str(), index, kind.local_extension()))
    }

    /// Path for an intermediate or final file produced inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Remove the directory. Failures are logged and never returned.
    pub async fn cleanup(mut self) {
        self.released = true;
        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => debug!(path = %self.path.display(), "Removed job workspace"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.path.display(),
                "Failed to remove job workspace: {}",
                e
            ),
        }
    }
}

impl Drop for JobWorkspace {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    path = %self.path.display(),
                    "Failed to remove job workspace on drop: {}",
                    e
                );
            }
        }
    }
}
