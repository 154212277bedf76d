//! In-process job registry.
//!
//! Records are inserted when a job is accepted, updated on every stage
//! transition and kept for a bounded time after reaching a terminal stage.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use rmix_models::{JobId, JobRecord, JobStage, JobVariant};

/// Shared table of job records keyed by id.
#[derive(Debug, Clone)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<JobId, JobRecord>>>,
    retention: Duration,
}

impl JobRegistry {
    pub fn new(retention: Duration) -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            retention,
        }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Register a newly accepted job in the `Created` stage.
    pub async fn insert(&self, id: &JobId, variant: JobVariant) {
        let record = JobRecord::new(id.clone(), variant);
        self.jobs.write().await.insert(id.clone(), record);
    }

    /// Move a job to `stage`. Returns `false` for unknown or terminal jobs.
    pub async fn advance(&self, id: &JobId, stage: JobStage) -> bool {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(id) {
            Some(record) => {
                let moved = record.advance(stage);
                if moved {
                    debug!(job_id = %id, stage = stage.as_str(), "Job stage changed");
                }
                moved
            }
            None => false,
        }
    }

    pub async fn complete(&self, id: &JobId) -> bool {
        self.advance(id, JobStage::Completed).await
    }

    pub async fn fail(&self, id: &JobId, error: impl Into<String>) -> bool {
        let mut jobs = self.jobs.write().await;
        jobs.get_mut(id).map(|r| r.fail(error)).unwrap_or(false)
    }

    pub async fn get(&self, id: &JobId) -> Option<JobRecord> {
        self.jobs.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// Drop terminal records older than the retention window.
    ///
    /// Returns the number of records removed.
    pub async fn prune_expired(&self) -> usize {
        let retention = match chrono::Duration::from_std(self.retention) {
            Ok(d) => d,
            Err(_) => return 0,
        };
        let cutoff = Utc::now() - retention;

        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, record| match record.finished_at {
            Some(finished) => finished > cutoff,
            None => true,
        });
        before - jobs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lifecycle() {
        let registry = JobRegistry::new(Duration::from_secs(60));
        let id = JobId::from_string("job-registry-1");

        registry.insert(&id, JobVariant::Single).await;
        assert_eq!(registry.get(&id).await.unwrap().stage, JobStage::Created);

        assert!(registry.advance(&id, JobStage::Fetching).await);
        assert!(registry.advance(&id, JobStage::Transforming).await);
        assert!(registry.complete(&id).await);

        let record = registry.get(&id).await.unwrap();
        assert_eq!(record.stage, JobStage::Completed);
        assert!(record.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_terminal_records_are_final() {
        let registry = JobRegistry::new(Duration::from_secs(60));
        let id = JobId::from_string("job-registry-2");

        registry.insert(&id, JobVariant::Stitch).await;
        assert!(registry.fail(&id, "Fetch failed: HTTP 404").await);
        assert!(!registry.complete(&id).await);
        assert!(!registry.fail(&id, "again").await);

        let record = registry.get(&id).await.unwrap();
        assert_eq!(record.stage, JobStage::Failed);
        assert_eq!(record.error.as_deref(), Some("Fetch failed: HTTP 404"));
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let registry = JobRegistry::new(Duration::from_secs(60));
        let id = JobId::from_string("never-seen");
        assert!(registry.get(&id).await.is_none());
        assert!(!registry.advance(&id, JobStage::Probing).await);
    }

    #[tokio::test]
    async fn test_prune_keeps_running_jobs() {
        let registry = JobRegistry::new(Duration::ZERO);
        let running = JobId::from_string("job-running");
        let done = JobId::from_string("job-done");

        registry.insert(&running, JobVariant::Single).await;
        registry.insert(&done, JobVariant::Single).await;
        registry.complete(&done).await;
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert_eq!(registry.prune_expired().await, 1);
        assert!(registry.get(&running).await.is_some());
        assert!(registry.get(&done).await.is_none());
    }

    #[tokio::test]
    async fn test_prune_respects_retention() {
        let registry = JobRegistry::new(Duration::from_secs(3600));
        let id = JobId::from_string("job-recent");
        registry.insert(&id, JobVariant::ImageOverlay).await;
        registry.complete(&id).await;

        assert_eq!(registry.prune_expired().await, 0);
        assert_eq!(registry.len().await, 1);
    }
}
