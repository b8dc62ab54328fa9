//! Batched pagination over the show index.

use std::future::Future;
use std::time::Duration;

use futures::future::join_all;

use crate::error::FetchError;
use crate::types::TvMazeShow;

use super::{PageFetchResult, TvMazeClient};

/// Reported to the caller after every batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchProgress {
    /// First page number of the batch just completed.
    pub batch_start: u32,
    /// Pages requested so far, across all batches.
    pub pages_requested: u32,
    /// `min(pages_requested / estimated_total_pages, 1.0)`.
    pub fraction: f64,
    pub shows_so_far: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub pages_requested: u32,
    /// Pages that gave up after retries and contributed nothing.
    pub pages_failed: u32,
    pub last_batch_start: u32,
}

#[derive(Debug)]
pub struct FetchedShows {
    pub shows: Vec<TvMazeShow>,
    pub summary: FetchSummary,
}

impl TvMazeClient {
    /// Fetches the whole show index, `concurrency` pages at a time.
    ///
    /// Each batch requests pages `[start, start + concurrency)` concurrently
    /// and waits for all of them. Shows from every successful page are kept,
    /// including pages in the same batch as the end-of-data response. A page
    /// that gave up after retries counts as empty and does not end
    /// pagination. After the first batch containing an end-of-data page the
    /// loop stops; otherwise it sleeps `inter_batch_delay_ms` and continues.
    ///
    /// `on_batch` is awaited after every batch, before the delay.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::PaginationLimit`] if `max_pages` pages were
    /// requested without seeing the end of the catalog.
    pub async fn fetch_all_shows<F, Fut>(&self, mut on_batch: F) -> Result<FetchedShows, FetchError>
    where
        F: FnMut(BatchProgress) -> Fut,
        Fut: Future<Output = ()>,
    {
        let batch_size = u32::try_from(self.config.concurrency).unwrap_or(u32::MAX);
        let max_pages = self.config.max_pages;
        let estimated_total = f64::from(self.config.estimated_total_pages.max(1));

        let mut shows: Vec<TvMazeShow> = Vec::new();
        let mut summary = FetchSummary::default();
        let mut start = 0u32;

        loop {
            if start >= max_pages {
                return Err(FetchError::PaginationLimit { max_pages });
            }

            let end = start.saturating_add(batch_size).min(max_pages);
            let results = join_all((start..end).map(|page| self.fetch_page(page))).await;

            let mut reached_end = false;
            for result in results {
                match result {
                    PageFetchResult::Shows(page_shows) => shows.extend(page_shows),
                    PageFetchResult::EndOfData => reached_end = true,
                    PageFetchResult::Failed(_) => summary.pages_failed += 1,
                }
            }

            summary.pages_requested = end;
            summary.last_batch_start = start;

            on_batch(BatchProgress {
                batch_start: start,
                pages_requested: end,
                fraction: (f64::from(end) / estimated_total).min(1.0),
                shows_so_far: shows.len(),
            })
            .await;

            if reached_end {
                break;
            }

            start = end;
            if self.config.inter_batch_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.inter_batch_delay_ms)).await;
            }
        }

        tracing::info!(
            shows = shows.len(),
            pages_requested = summary.pages_requested,
            pages_failed = summary.pages_failed,
            last_batch_start = summary.last_batch_start,
            "show index fetch complete"
        );

        Ok(FetchedShows { shows, summary })
    }
}
