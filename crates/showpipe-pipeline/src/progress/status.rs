//! The per-run status record and its change-detection signature.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Step text written when a run is created.
pub const INITIAL_STEP: &str = "Starting";

/// Step text written by [`super::ProgressTracker::complete`].
pub const COMPLETED_STEP: &str = "Completed";

/// Stage of a pipeline run.
///
/// Runs move forward through `Created → Fetching → Aggregating → Enriching →
/// Completed`, or to `Failed` from any stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    Created,
    Fetching,
    Aggregating,
    Enriching,
    Completed,
    Failed,
}

impl RunStage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RunStage::Created => "created",
            RunStage::Fetching => "fetching",
            RunStage::Aggregating => "aggregating",
            RunStage::Enriching => "enriching",
            RunStage::Completed => "completed",
            RunStage::Failed => "failed",
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStage::Completed | RunStage::Failed)
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(RunStage::Created),
            "fetching" => Ok(RunStage::Fetching),
            "aggregating" => Ok(RunStage::Aggregating),
            "enriching" => Ok(RunStage::Enriching),
            "completed" => Ok(RunStage::Completed),
            "failed" => Ok(RunStage::Failed),
            other => Err(format!("unknown run stage \"{other}\"")),
        }
    }
}

/// Snapshot of one run as seen by pollers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatus {
    pub run_id: Uuid,
    pub stage: RunStage,
    pub running: bool,
    pub step: String,
    /// Percent of the whole run, `0..=100`. Never decreases within a run.
    pub progress: u8,
    pub error: Option<String>,
    /// Last write time. Excluded from [`RunStatus::signature`].
    pub updated_at: DateTime<Utc>,
}

impl RunStatus {
    #[must_use]
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            stage: RunStage::Created,
            running: true,
            step: INITIAL_STEP.to_owned(),
            progress: 0,
            error: None,
            updated_at: Utc::now(),
        }
    }

    /// Lowercase hex SHA-256 over the canonical JSON of every field except
    /// `updated_at`. Two snapshots with equal signatures are equal for
    /// polling purposes.
    #[must_use]
    pub fn signature(&self) -> String {
        // `json!` objects serialize with sorted keys.
        let canonical = serde_json::json!({
            "run_id": self.run_id,
            "stage": self.stage,
            "running": self.running,
            "step": self.step,
            "progress": self.progress,
            "error": self.error,
        })
        .to_string();

        format!("{:x}", Sha256::digest(canonical.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_status_starts_running_at_zero() {
        let status = RunStatus::new(Uuid::new_v4());
        assert_eq!(status.stage, RunStage::Created);
        assert!(status.running);
        assert_eq!(status.progress, 0);
        assert_eq!(status.step, INITIAL_STEP);
        assert!(status.error.is_none());
    }

    #[test]
    fn signature_is_64_lowercase_hex_chars() {
        let sig = RunStatus::new(Uuid::new_v4()).signature();
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn signature_ignores_updated_at() {
        let a = RunStatus::new(Uuid::new_v4());
        let mut b = a.clone();
        b.updated_at = a.updated_at + chrono::Duration::seconds(30);
        assert_eq!(a.signature(), b.signature());
    }

    #[test]
    fn signature_changes_with_any_visible_field() {
        let base = RunStatus::new(Uuid::new_v4());
        let sig = base.signature();

        let mut progressed = base.clone();
        progressed.progress = 1;
        assert_ne!(progressed.signature(), sig);

        let mut stepped = base.clone();
        stepped.step = "Fetching all shows".to_owned();
        assert_ne!(stepped.signature(), sig);

        let mut failed = base.clone();
        failed.error = Some("boom".to_owned());
        assert_ne!(failed.signature(), sig);

        let mut staged = base;
        staged.stage = RunStage::Fetching;
        assert_ne!(staged.signature(), sig);
    }

    #[test]
    fn stage_round_trips_through_str() {
        for stage in [
            RunStage::Created,
            RunStage::Fetching,
            RunStage::Aggregating,
            RunStage::Enriching,
            RunStage::Completed,
            RunStage::Failed,
        ] {
            assert_eq!(stage.as_str().parse::<RunStage>(), Ok(stage));
        }
        assert!("paused".parse::<RunStage>().is_err());
    }

    #[test]
    fn only_completed_and_failed_are_terminal() {
        assert!(RunStage::Completed.is_terminal());
        assert!(RunStage::Failed.is_terminal());
        assert!(!RunStage::Enriching.is_terminal());
    }
}
