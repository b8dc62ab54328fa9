//! Run status tracking with signature-based change detection.

mod status;
mod store;
mod tracker;

pub use status::{RunStage, RunStatus, COMPLETED_STEP, INITIAL_STEP};
pub use store::{MemoryStatusStore, PgStatusStore, StatusStore, StatusStoreError};
pub use tracker::{ProgressTracker, StatusPoll, MAX_IN_FLIGHT_PROGRESS};
