//! Stage sequencing for one pipeline run.
//!
//! A run moves through three stages, each reporting into its own band of
//! overall progress:
//!
//! | Stage | Band | Work |
//! |-------|------|------|
//! | fetching | 0–70 | page through the show index, upsert `all_shows` |
//! | aggregating | 70–80 | recompute `top_shows` for the lookback window |
//! | enriching | 80–100 | fetch cast for every top show, replace `top_show_cast` |
//!
//! A stage starts only after the previous stage's writes have committed.
//! The first stage error marks the run failed with the error's message;
//! already committed output is left in place.

use std::sync::Arc;

use showpipe_core::{validate_lookback_years, AppConfig, CoreError, TopShowCriteria};
use showpipe_db::DbError;
use showpipe_tvmaze::{normalize_cast, normalize_show, FetchError, FetcherConfig, TvMazeClient};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::progress::{ProgressTracker, RunStage, StatusStoreError};

const FETCH_END: u8 = 70;
const AGGREGATE_END: u8 = 80;
/// Reported once cast fetches return, before the cast write.
const CAST_FETCHED: u8 = 95;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    InvalidLookback(#[from] CoreError),

    #[error("catalog fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("database error: {0}")]
    Db(#[from] DbError),

    #[error("status store error: {0}")]
    Status(#[from] StatusStoreError),
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub fetcher: FetcherConfig,
    pub default_lookback_years: u16,
}

impl PipelineConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            fetcher: FetcherConfig::from_app_config(config),
            default_lookback_years: config.default_lookback_years,
        }
    }
}

/// Counts reported by a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub shows_fetched: usize,
    pub shows_stored: usize,
    pub pages_failed: u32,
    pub top_shows: u64,
    pub cast_entries: u64,
    /// Top shows whose cast fetch gave up.
    pub cast_failures: usize,
}

/// State threaded through the stages of one run.
#[derive(Clone)]
pub struct RunContext {
    pub run_id: Uuid,
    pub lookback_years: u16,
    tracker: ProgressTracker,
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("run_id", &self.run_id)
            .field("lookback_years", &self.lookback_years)
            .finish_non_exhaustive()
    }
}

impl RunContext {
    async fn report(
        &self,
        stage: RunStage,
        step: impl Into<String>,
        progress: u8,
    ) -> Result<(), StatusStoreError> {
        self.tracker
            .update(self.run_id, stage, step, progress)
            .await
            .map(|_| ())
    }
}

pub struct Pipeline {
    pool: PgPool,
    client: TvMazeClient,
    tracker: ProgressTracker,
    default_lookback_years: u16,
}

impl Pipeline {
    /// # Errors
    ///
    /// Returns [`PipelineError::Fetch`] if the catalog client cannot be built.
    pub fn new(
        pool: PgPool,
        config: PipelineConfig,
        tracker: ProgressTracker,
    ) -> Result<Self, PipelineError> {
        Ok(Self {
            pool,
            client: TvMazeClient::new(config.fetcher)?,
            tracker,
            default_lookback_years: config.default_lookback_years,
        })
    }

    #[must_use]
    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    #[must_use]
    pub fn default_lookback_years(&self) -> u16 {
        self.default_lookback_years
    }

    /// Validates the lookback window and writes the initial status record.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidLookback`] for a negative or oversized
    /// window, or [`PipelineError::Status`] if the record cannot be written.
    pub async fn create_run(&self, years: Option<i64>) -> Result<RunContext, PipelineError> {
        let lookback_years = match years {
            Some(years) => validate_lookback_years(years)?,
            None => self.default_lookback_years,
        };

        let run_id = Uuid::new_v4();
        self.tracker.init(run_id).await?;
        tracing::info!(%run_id, lookback_years, "pipeline run created");

        Ok(RunContext {
            run_id,
            lookback_years,
            tracker: self.tracker.clone(),
        })
    }

    /// Creates a run and executes it on a background task. Returns as soon
    /// as the run's status record exists.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create_run`]. Stage failures are recorded in the run
    /// status, not returned.
    pub async fn start(self: Arc<Self>, years: Option<i64>) -> Result<RunContext, PipelineError> {
        let ctx = self.create_run(years).await?;
        let task_ctx = ctx.clone();

        tokio::spawn(async move {
            // Failures are already recorded in the run status.
            let _ = self.run(&task_ctx).await;
        });

        Ok(ctx)
    }

    /// Executes every stage of the run in order, then marks it completed.
    ///
    /// # Errors
    ///
    /// Returns the first stage error after recording its message via
    /// [`ProgressTracker::set_error`].
    pub async fn run(&self, ctx: &RunContext) -> Result<RunSummary, PipelineError> {
        match self.run_stages(ctx).await {
            Ok(summary) => {
                self.tracker.complete(ctx.run_id).await?;
                tracing::info!(
                    run_id = %ctx.run_id,
                    shows = summary.shows_stored,
                    top_shows = summary.top_shows,
                    cast_entries = summary.cast_entries,
                    cast_failures = summary.cast_failures,
                    "pipeline run completed"
                );
                Ok(summary)
            }
            Err(e) => {
                tracing::error!(run_id = %ctx.run_id, error = %e, "pipeline run failed");
                if let Err(status_err) = self.tracker.set_error(ctx.run_id, e.to_string()).await {
                    tracing::error!(
                        run_id = %ctx.run_id,
                        error = %status_err,
                        "failed to record pipeline failure"
                    );
                }
                Err(e)
            }
        }
    }

    async fn run_stages(&self, ctx: &RunContext) -> Result<RunSummary, PipelineError> {
        let (shows_fetched, shows_stored, pages_failed) = self.fetch_stage(ctx).await?;
        let top_shows = self.aggregate_stage(ctx).await?;
        let (cast_entries, cast_failures) = self.enrich_stage(ctx).await?;

        Ok(RunSummary {
            shows_fetched,
            shows_stored,
            pages_failed,
            top_shows,
            cast_entries,
            cast_failures,
        })
    }

    async fn fetch_stage(&self, ctx: &RunContext) -> Result<(usize, usize, u32), PipelineError> {
        ctx.report(RunStage::Fetching, "Fetching all shows", 0)
            .await?;

        let batch_ctx = ctx.clone();
        let fetched = self
            .client
            .fetch_all_shows(move |batch| {
                let ctx = batch_ctx.clone();
                async move {
                    let step = format!("Fetching shows: page offset {}", batch.batch_start);
                    let progress = scale_into_band(batch.fraction, 0, FETCH_END);
                    if let Err(e) = ctx.report(RunStage::Fetching, step, progress).await {
                        tracing::warn!(run_id = %ctx.run_id, error = %e, "progress update failed");
                    }
                }
            })
            .await?;

        let shows_fetched = fetched.shows.len();
        let shows: Vec<_> = fetched.shows.into_iter().map(normalize_show).collect();
        let shows_stored = showpipe_db::upsert_shows(&self.pool, &shows).await?;

        ctx.report(
            RunStage::Fetching,
            format!("Stored {shows_stored} shows"),
            FETCH_END,
        )
        .await?;

        Ok((shows_fetched, shows_stored, fetched.summary.pages_failed))
    }

    async fn aggregate_stage(&self, ctx: &RunContext) -> Result<u64, PipelineError> {
        ctx.report(RunStage::Aggregating, "Computing top shows", FETCH_END)
            .await?;

        let criteria = TopShowCriteria::english_action(ctx.lookback_years);
        let top_shows = showpipe_db::recompute_top_shows(&self.pool, &criteria).await?;

        ctx.report(
            RunStage::Aggregating,
            format!("Selected {top_shows} top shows"),
            AGGREGATE_END,
        )
        .await?;

        Ok(top_shows)
    }

    async fn enrich_stage(&self, ctx: &RunContext) -> Result<(u64, usize), PipelineError> {
        ctx.report(RunStage::Enriching, "Fetching cast for top shows", AGGREGATE_END)
            .await?;

        let refs = showpipe_db::list_top_show_refs(&self.pool).await?;
        let results = self.client.fetch_all_cast(&refs).await;

        let cast_failures = results.iter().filter(|r| r.error.is_some()).count();
        let entries: Vec<_> = results
            .into_iter()
            .flat_map(|r| normalize_cast(r.show_id, &r.show_name, r.cast))
            .collect();

        ctx.report(
            RunStage::Enriching,
            format!("Storing {} cast entries", entries.len()),
            CAST_FETCHED,
        )
        .await?;

        let cast_entries = showpipe_db::replace_show_cast(&self.pool, &entries).await?;
        Ok((cast_entries, cast_failures))
    }
}

/// Maps a `0.0..=1.0` fraction onto the `start..=end` progress band.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale_into_band(fraction: f64, start: u8, end: u8) -> u8 {
    let width = f64::from(end.saturating_sub(start));
    let offset = (fraction.clamp(0.0, 1.0) * width).floor() as u8;
    start.saturating_add(offset).min(end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_into_band_maps_fraction() {
        assert_eq!(scale_into_band(0.0, 0, FETCH_END), 0);
        assert_eq!(scale_into_band(0.5, 0, FETCH_END), 35);
        assert_eq!(scale_into_band(1.0, 0, FETCH_END), 70);
    }

    #[test]
    fn scale_into_band_clamps_out_of_range_fractions() {
        assert_eq!(scale_into_band(1.7, 0, FETCH_END), 70);
        assert_eq!(scale_into_band(-0.2, 0, FETCH_END), 0);
        assert_eq!(scale_into_band(f64::NAN, 70, 80), 70);
    }

    #[test]
    fn scale_into_band_offsets_from_start() {
        assert_eq!(scale_into_band(0.5, AGGREGATE_END, 100), 90);
    }

    #[test]
    fn pipeline_error_messages_carry_the_cause() {
        let err = PipelineError::from(FetchError::PaginationLimit { max_pages: 5 });
        assert_eq!(
            err.to_string(),
            "catalog fetch failed: pagination limit reached: no end-of-data response within 5 pages"
        );
    }

    #[test]
    fn run_context_debug_shows_run_fields() {
        let ctx = RunContext {
            run_id: Uuid::nil(),
            lookback_years: 4,
            tracker: ProgressTracker::new(std::sync::Arc::new(
                crate::progress::MemoryStatusStore::new(),
            )),
        };
        let rendered = format!("{ctx:?}");
        assert!(rendered.contains("lookback_years: 4"), "{rendered}");
        assert!(rendered.contains(&Uuid::nil().to_string()), "{rendered}");
    }
}
