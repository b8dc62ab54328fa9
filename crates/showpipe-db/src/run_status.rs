//! Database operations for the `pipeline_run_status` blackboard.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `pipeline_run_status` table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RunStatusRow {
    pub run_id: Uuid,
    pub stage: String,
    pub running: bool,
    pub step: String,
    /// The schema constrains this to `0..=100`.
    pub progress: i16,
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Writes the full status record for a run, replacing any previous record.
///
/// `updated_at` on the row is ignored; the database stamps `NOW()`.
///
/// # Errors
///
/// Returns [`DbError::InvalidProgress`] if `row.progress` is outside
/// `0..=100`, or [`DbError::Sqlx`] if the upsert fails.
pub async fn put_run_status(pool: &PgPool, row: &RunStatusRow) -> Result<(), DbError> {
    if !(0..=100).contains(&row.progress) {
        return Err(DbError::InvalidProgress(row.progress));
    }

    sqlx::query(
        "INSERT INTO pipeline_run_status (run_id, stage, running, step, progress, error) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (run_id) DO UPDATE SET \
             stage      = EXCLUDED.stage, \
             running    = EXCLUDED.running, \
             step       = EXCLUDED.step, \
             progress   = EXCLUDED.progress, \
             error      = EXCLUDED.error, \
             updated_at = NOW()",
    )
    .bind(row.run_id)
    .bind(&row.stage)
    .bind(row.running)
    .bind(&row.step)
    .bind(row.progress)
    .bind(&row.error)
    .execute(pool)
    .await?;

    Ok(())
}

/// Fetches the status record for a run, or `None` if the id is unknown.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_run_status(pool: &PgPool, run_id: Uuid) -> Result<Option<RunStatusRow>, DbError> {
    let row = sqlx::query_as::<_, RunStatusRow>(
        "SELECT run_id, stage, running, step, progress, error, updated_at \
         FROM pipeline_run_status \
         WHERE run_id = $1",
    )
    .bind(run_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
