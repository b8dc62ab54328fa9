pub mod client;
pub mod error;
pub mod normalize;
pub mod retry;
pub mod types;

pub use client::{
    BatchProgress, FetchSummary, FetchedShows, FetcherConfig, PageFetchResult, ShowCast,
    TvMazeClient,
};
pub use error::FetchError;
pub use normalize::{normalize_cast, normalize_show};
pub use retry::{RetryOutcome, RetryPolicy};
pub use types::{TvMazeCastMember, TvMazeCharacter, TvMazePerson, TvMazeShow};
