//! Job identity, variants and lifecycle stages.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The three supported job shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum JobVariant {
    /// One video with replacement music and optional overlay
    Single,
    /// Several scene clips concatenated, then music and optional overlay
    Stitch,
    /// Overlay image composited onto a base image
    ImageOverlay,
}

impl JobVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobVariant::Single => "single",
            JobVariant::Stitch => "stitch",
            JobVariant::ImageOverlay => "image-overlay",
        }
    }
}

impl fmt::Display for JobVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle stage of a job.
///
/// `Completed` and `Failed` are terminal. Non-terminal stages may be
/// revisited (the stitch variant probes between two transform stages).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    #[default]
    Created,
    Fetching,
    Probing,
    Transforming,
    Finalizing,
    Completed,
    Failed,
}

impl JobStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStage::Created => "created",
            JobStage::Fetching => "fetching",
            JobStage::Probing => "probing",
            JobStage::Transforming => "transforming",
            JobStage::Finalizing => "finalizing",
            JobStage::Completed => "completed",
            JobStage::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStage::Completed | JobStage::Failed)
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registry entry describing one job.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JobRecord {
    pub id: JobId,
    pub variant: JobVariant,
    pub stage: JobStage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set once the job reaches a terminal stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Present only when the job failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobRecord {
    /// Create a record in the `Created` stage.
    pub fn new(id: JobId, variant: JobVariant) -> Self {
        let now = Utc::now();
        Self {
            id,
            variant,
            stage: JobStage::Created,
            created_at: now,
            updated_at: now,
            finished_at: None,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }

    /// Move to a new stage. Terminal records are never changed.
    ///
    /// Returns `false` when the transition was rejected.
    pub fn advance(&mut self, stage: JobStage) -> bool {
        if self.is_terminal() {
            return false;
        }
        let now = Utc::now();
        self.stage = stage;
        self.updated_at = now;
        if stage.is_terminal() {
            self.finished_at = Some(now);
        }
        true
    }

    /// Mark the job failed with an error detail.
    pub fn fail(&mut self, error: impl Into<String>) -> bool {
        if !self.advance(JobStage::Failed) {
            return false;
        }
        self.error = Some(error.into());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_is_unique() {
        assert_ne!(JobId::new(), JobId::new());
    }

    #[test]
    fn test_variant_serialization() {
        let json = serde_json::to_string(&JobVariant::ImageOverlay).unwrap();
        assert_eq!(json, "\"image-overlay\"");
    }

    #[test]
    fn test_terminal_stage_is_final() {
        let mut record = JobRecord::new(JobId::new(), JobVariant::Single);
        assert!(record.advance(JobStage::Fetching));
        assert!(record.advance(JobStage::Completed));
        assert!(record.finished_at.is_some());

        assert!(!record.advance(JobStage::Transforming));
        assert!(!record.fail("late failure"));
        assert_eq!(record.stage, JobStage::Completed);
        assert!(record.error.is_none());
    }

    #[test]
    fn test_fail_records_error() {
        let mut record = JobRecord::new(JobId::new(), JobVariant::Stitch);
        assert!(record.fail("fetch failed"));
        assert_eq!(record.stage, JobStage::Failed);
        assert_eq!(record.error.as_deref(), Some("fetch failed"));
    }
}
