//! Run orchestration for the catalog ingest: progress tracking and the
//! fetch, aggregate, enrich stage sequence.

pub mod orchestrator;
pub mod progress;

pub use orchestrator::{Pipeline, PipelineConfig, PipelineError, RunContext, RunSummary};
pub use progress::{
    MemoryStatusStore, PgStatusStore, ProgressTracker, RunStage, RunStatus, StatusPoll,
    StatusStore, StatusStoreError,
};
