//! Keyed storage for run status records.

use std::collections::HashMap;

use async_trait::async_trait;
use showpipe_db::{DbError, RunStatusRow};
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::status::{RunStage, RunStatus};

#[derive(Debug, Error)]
pub enum StatusStoreError {
    #[error("unknown run {0}")]
    UnknownRun(Uuid),

    #[error("stored status for run {run_id} is unreadable: {reason}")]
    Corrupt { run_id: Uuid, reason: String },

    #[error(transparent)]
    Db(#[from] DbError),
}

/// Where run status records live. Implementations overwrite the whole
/// record on `put`.
#[async_trait]
pub trait StatusStore: Send + Sync {
    async fn put(&self, status: &RunStatus) -> Result<(), StatusStoreError>;

    async fn get(&self, run_id: Uuid) -> Result<Option<RunStatus>, StatusStoreError>;
}

/// Process-local store. Records live until the process exits.
#[derive(Debug, Default)]
pub struct MemoryStatusStore {
    records: RwLock<HashMap<Uuid, RunStatus>>,
}

impl MemoryStatusStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatusStore for MemoryStatusStore {
    async fn put(&self, status: &RunStatus) -> Result<(), StatusStoreError> {
        self.records
            .write()
            .await
            .insert(status.run_id, status.clone());
        Ok(())
    }

    async fn get(&self, run_id: Uuid) -> Result<Option<RunStatus>, StatusStoreError> {
        Ok(self.records.read().await.get(&run_id).cloned())
    }
}

/// Store backed by the `pipeline_run_status` table, shared by every process
/// pointed at the same database.
#[derive(Debug, Clone)]
pub struct PgStatusStore {
    pool: PgPool,
}

impl PgStatusStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl From<&RunStatus> for RunStatusRow {
    fn from(status: &RunStatus) -> Self {
        RunStatusRow {
            run_id: status.run_id,
            stage: status.stage.as_str().to_owned(),
            running: status.running,
            step: status.step.clone(),
            progress: i16::from(status.progress),
            error: status.error.clone(),
            updated_at: status.updated_at,
        }
    }
}

fn status_from_row(row: RunStatusRow) -> Result<RunStatus, StatusStoreError> {
    let stage = row
        .stage
        .parse::<RunStage>()
        .map_err(|reason| StatusStoreError::Corrupt {
            run_id: row.run_id,
            reason,
        })?;
    let progress = u8::try_from(row.progress).map_err(|_| StatusStoreError::Corrupt {
        run_id: row.run_id,
        reason: format!("progress {} out of range", row.progress),
    })?;

    Ok(RunStatus {
        run_id: row.run_id,
        stage,
        running: row.running,
        step: row.step,
        progress,
        error: row.error,
        updated_at: row.updated_at,
    })
}

#[async_trait]
impl StatusStore for PgStatusStore {
    async fn put(&self, status: &RunStatus) -> Result<(), StatusStoreError> {
        showpipe_db::put_run_status(&self.pool, &RunStatusRow::from(status)).await?;
        Ok(())
    }

    async fn get(&self, run_id: Uuid) -> Result<Option<RunStatus>, StatusStoreError> {
        showpipe_db::get_run_status(&self.pool, run_id)
            .await?
            .map(status_from_row)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn _assert_object_safe(_: &dyn StatusStore) {}

    #[tokio::test]
    async fn memory_store_round_trips_and_overwrites() {
        let store = MemoryStatusStore::new();
        let mut status = RunStatus::new(Uuid::new_v4());
        store.put(&status).await.unwrap();

        status.progress = 40;
        store.put(&status).await.unwrap();

        let stored = store.get(status.run_id).await.unwrap().unwrap();
        assert_eq!(stored.progress, 40);
    }

    #[tokio::test]
    async fn memory_store_unknown_id_is_none() {
        let store = MemoryStatusStore::new();
        assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[test]
    fn row_conversion_round_trips() {
        let mut status = RunStatus::new(Uuid::new_v4());
        status.stage = RunStage::Aggregating;
        status.progress = 75;
        let row = RunStatusRow::from(&status);
        assert_eq!(row.stage, "aggregating");
        assert_eq!(row.progress, 75);
        assert_eq!(status_from_row(row).unwrap(), status);
    }

    #[test]
    fn row_with_unknown_stage_is_corrupt() {
        let row = RunStatusRow {
            run_id: Uuid::new_v4(),
            stage: "paused".to_owned(),
            running: true,
            step: "x".to_owned(),
            progress: 10,
            error: None,
            updated_at: Utc::now(),
        };
        assert!(matches!(
            status_from_row(row),
            Err(StatusStoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn row_with_negative_progress_is_corrupt() {
        let row = RunStatusRow {
            run_id: Uuid::new_v4(),
            stage: "fetching".to_owned(),
            running: true,
            step: "x".to_owned(),
            progress: -1,
            error: None,
            updated_at: Utc::now(),
        };
        assert!(matches!(
            status_from_row(row),
            Err(StatusStoreError::Corrupt { .. })
        ));
    }
}
