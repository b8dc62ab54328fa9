//! Cast lookups for a set of shows.

use futures::future::join_all;

use crate::error::FetchError;
use crate::retry::RetryOutcome;
use crate::types::TvMazeCastMember;

use super::TvMazeClient;

/// Cast fetch result for one show.
#[derive(Debug)]
pub struct ShowCast {
    pub show_id: i64,
    pub show_name: String,
    /// Empty when the show has no cast resource or the fetch failed.
    pub cast: Vec<TvMazeCastMember>,
    pub error: Option<FetchError>,
}

impl TvMazeClient {
    /// Fetches one show's cast under the semaphore and retry policy.
    ///
    /// A 404 is "no cast" and returns an empty list.
    ///
    /// # Errors
    ///
    /// Returns the last [`FetchError`] once retries are exhausted, or the
    /// first non-retriable one.
    pub async fn fetch_cast_for_show(
        &self,
        show_id: i64,
    ) -> Result<Vec<TvMazeCastMember>, FetchError> {
        let _permit = self.permits.acquire().await?;
        let target = self.cast_url(show_id);

        match self
            .config
            .retry
            .run(&target, || self.fetch_show_cast(show_id))
            .await
        {
            RetryOutcome::Value(cast) => Ok(cast),
            RetryOutcome::Sentinel => {
                tracing::info!(show_id, "show has no cast resource; skipping");
                Ok(Vec::new())
            }
            RetryOutcome::GaveUp(err) => Err(err),
        }
    }

    /// Fetches the cast of every show concurrently, one request per show.
    ///
    /// A failure for one show never affects the others; it is logged and
    /// reported through [`ShowCast::error`] with an empty cast. Output order
    /// matches `shows`.
    pub async fn fetch_all_cast(&self, shows: &[(i64, String)]) -> Vec<ShowCast> {
        join_all(shows.iter().map(|(show_id, show_name)| async move {
            match self.fetch_cast_for_show(*show_id).await {
                Ok(cast) => {
                    tracing::debug!(show_id, members = cast.len(), "fetched cast");
                    ShowCast {
                        show_id: *show_id,
                        show_name: show_name.clone(),
                        cast,
                        error: None,
                    }
                }
                Err(e) => {
                    tracing::error!(show_id, error = %e, "cast fetch failed; continuing");
                    ShowCast {
                        show_id: *show_id,
                        show_name: show_name.clone(),
                        cast: Vec::new(),
                        error: Some(e),
                    }
                }
            }
        }))
        .await
    }
}
