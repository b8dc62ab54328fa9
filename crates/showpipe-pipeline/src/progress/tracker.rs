use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::status::{RunStage, RunStatus, COMPLETED_STEP};
use super::store::{StatusStore, StatusStoreError};

/// Highest progress a run can report before [`ProgressTracker::complete`].
pub const MAX_IN_FLIGHT_PROGRESS: u8 = 99;

/// Result of polling a run with a previously seen signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusPoll {
    NotFound,
    /// The caller's signature matches the current snapshot.
    Unchanged,
    Changed { status: RunStatus, signature: String },
}

/// Read-modify-write access to run status records.
///
/// Each run has a single writer at a time (its orchestrator), so updates
/// are not guarded against concurrent writers for the same run id.
#[derive(Clone)]
pub struct ProgressTracker {
    store: Arc<dyn StatusStore>,
}

impl ProgressTracker {
    #[must_use]
    pub fn new(store: Arc<dyn StatusStore>) -> Self {
        Self { store }
    }

    /// Creates the record for a new run: `created`, running, progress 0.
    ///
    /// # Errors
    ///
    /// Returns [`StatusStoreError`] if the store write fails.
    pub async fn init(&self, run_id: Uuid) -> Result<RunStatus, StatusStoreError> {
        let status = RunStatus::new(run_id);
        self.store.put(&status).await?;
        Ok(status)
    }

    /// Records a new stage, step, and progress for a running run.
    ///
    /// Progress is clamped so it never decreases and never reaches 100
    /// before [`Self::complete`].
    ///
    /// # Errors
    ///
    /// Returns [`StatusStoreError::UnknownRun`] if `init` was never called
    /// for `run_id`, or a store error.
    pub async fn update(
        &self,
        run_id: Uuid,
        stage: RunStage,
        step: impl Into<String>,
        progress: u8,
    ) -> Result<RunStatus, StatusStoreError> {
        let mut status = self.require(run_id).await?;
        status.stage = stage;
        status.running = true;
        status.step = step.into();
        status.progress = status.progress.max(progress.min(MAX_IN_FLIGHT_PROGRESS));
        status.updated_at = Utc::now();
        self.store.put(&status).await?;

        tracing::debug!(
            %run_id,
            stage = %status.stage,
            step = %status.step,
            progress = status.progress,
            "run progress"
        );
        Ok(status)
    }

    /// Marks the run failed with `message`, keeping its last step and
    /// progress. A run with no record gets one, so the failure stays visible.
    ///
    /// # Errors
    ///
    /// Returns [`StatusStoreError`] if the store read or write fails.
    pub async fn set_error(
        &self,
        run_id: Uuid,
        message: impl Into<String>,
    ) -> Result<RunStatus, StatusStoreError> {
        let mut status = self
            .store
            .get(run_id)
            .await?
            .unwrap_or_else(|| RunStatus::new(run_id));
        status.stage = RunStage::Failed;
        status.running = false;
        status.error = Some(message.into());
        status.updated_at = Utc::now();
        self.store.put(&status).await?;
        Ok(status)
    }

    /// Terminal success: `completed`, not running, progress 100.
    ///
    /// # Errors
    ///
    /// Returns [`StatusStoreError::UnknownRun`] for an unknown run, or a
    /// store error.
    pub async fn complete(&self, run_id: Uuid) -> Result<RunStatus, StatusStoreError> {
        let mut status = self.require(run_id).await?;
        status.stage = RunStage::Completed;
        status.running = false;
        status.step = COMPLETED_STEP.to_owned();
        status.progress = 100;
        status.updated_at = Utc::now();
        self.store.put(&status).await?;
        Ok(status)
    }

    /// # Errors
    ///
    /// Returns [`StatusStoreError`] if the store read fails.
    pub async fn get(&self, run_id: Uuid) -> Result<Option<RunStatus>, StatusStoreError> {
        self.store.get(run_id).await
    }

    /// Returns the snapshot only if it differs from `seen_signature`.
    ///
    /// # Errors
    ///
    /// Returns [`StatusStoreError`] if the store read fails.
    pub async fn poll(
        &self,
        run_id: Uuid,
        seen_signature: Option<&str>,
    ) -> Result<StatusPoll, StatusStoreError> {
        let Some(status) = self.store.get(run_id).await? else {
            return Ok(StatusPoll::NotFound);
        };

        let signature = status.signature();
        if seen_signature == Some(signature.as_str()) {
            return Ok(StatusPoll::Unchanged);
        }
        Ok(StatusPoll::Changed { status, signature })
    }

    async fn require(&self, run_id: Uuid) -> Result<RunStatus, StatusStoreError> {
        self.store
            .get(run_id)
            .await?
            .ok_or(StatusStoreError::UnknownRun(run_id))
    }
}
