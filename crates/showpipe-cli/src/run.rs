//! Foreground pipeline runs and run-status lookups.

use std::sync::Arc;

use showpipe_core::{AppConfig, StatusStoreKind};
use showpipe_pipeline::{
    MemoryStatusStore, PgStatusStore, Pipeline, PipelineConfig, ProgressTracker, StatusStore,
};
use uuid::Uuid;

fn status_store(pool: &sqlx::PgPool, kind: StatusStoreKind) -> Arc<dyn StatusStore> {
    match kind {
        StatusStoreKind::Memory => Arc::new(MemoryStatusStore::new()),
        StatusStoreKind::Postgres => Arc::new(PgStatusStore::new(pool.clone())),
    }
}

/// Runs every stage to completion and prints the run summary.
///
/// # Errors
///
/// Returns an error if `years` is invalid, the pipeline cannot be built, or
/// any stage fails. A failed stage is also recorded in the run status.
pub(crate) async fn run_pipeline(
    pool: sqlx::PgPool,
    config: &AppConfig,
    years: Option<i64>,
) -> anyhow::Result<()> {
    showpipe_db::run_migrations(&pool).await?;

    let tracker = ProgressTracker::new(status_store(&pool, config.status_store));
    let pipeline = Pipeline::new(pool, PipelineConfig::from_app_config(config), tracker)?;

    let ctx = pipeline.create_run(years).await?;
    println!(
        "run {} started (lookback {} years)",
        ctx.run_id, ctx.lookback_years
    );

    let summary = pipeline.run(&ctx).await?;
    tracing::debug!(run_id = %ctx.run_id, ?summary, "foreground run finished");
    println!("run {} completed", ctx.run_id);
    println!(
        "  shows fetched: {} (stored {}, failed pages {})",
        summary.shows_fetched, summary.shows_stored, summary.pages_failed
    );
    println!("  top shows:     {}", summary.top_shows);
    println!(
        "  cast entries:  {} ({} show(s) without cast due to errors)",
        summary.cast_entries, summary.cast_failures
    );

    Ok(())
}

/// Prints the stored status of a run. Only runs recorded in the Postgres
/// status store are visible to a separate process.
///
/// # Errors
///
/// Returns an error if the run is unknown or the lookup fails.
pub(crate) async fn print_run_status(pool: sqlx::PgPool, run_id: Uuid) -> anyhow::Result<()> {
    let tracker = ProgressTracker::new(Arc::new(PgStatusStore::new(pool)));
    let status = tracker
        .get(run_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("run {run_id} not found in the Postgres status store"))?;

    println!("run:       {}", status.run_id);
    println!("stage:     {}", status.stage);
    println!("running:   {}", status.running);
    println!("step:      {}", status.step);
    println!("progress:  {}%", status.progress);
    if let Some(error) = &status.error {
        println!("error:     {error}");
    }
    println!("updated:   {}", status.updated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("signature: {}", status.signature());

    Ok(())
}
