//! HTTP client for the TVMaze catalog: paged show listing and per-show cast.

mod cast;
mod fetch_all;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use showpipe_core::AppConfig;
use tokio::sync::Semaphore;

use crate::error::FetchError;
use crate::retry::{RetryOutcome, RetryPolicy};
use crate::types::{TvMazeCastMember, TvMazeShow};

pub use cast::ShowCast;
pub use fetch_all::{BatchProgress, FetchSummary, FetchedShows};

/// Fetcher tuning, built from [`AppConfig`] by [`FetcherConfig::from_app_config`].
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Origin of the catalog API, without a trailing slash.
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Pages per batch, and the width of the request semaphore.
    pub concurrency: usize,
    pub retry: RetryPolicy,
    pub inter_batch_delay_ms: u64,
    /// Progress denominator. The catalog exposes no total count.
    pub estimated_total_pages: u32,
    /// Hard stop if the end-of-data response never arrives.
    pub max_pages: u32,
}

impl FetcherConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.tvmaze_base_url.clone(),
            timeout_secs: config.http_timeout_secs,
            user_agent: config.user_agent.clone(),
            concurrency: config.fetch_concurrency,
            retry: RetryPolicy::new(config.fetch_max_attempts, config.retry_backoff_base_ms),
            inter_batch_delay_ms: config.inter_batch_delay_ms,
            estimated_total_pages: config.estimated_total_pages,
            max_pages: config.max_pages,
        }
    }
}

/// Outcome of fetching one page after retries.
#[derive(Debug)]
pub enum PageFetchResult {
    Shows(Vec<TvMazeShow>),
    /// The page is past the end of the catalog.
    EndOfData,
    /// Retries were exhausted or the error was not retriable. Treated as an
    /// empty page; does not stop pagination.
    Failed(FetchError),
}

impl PageFetchResult {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, PageFetchResult::EndOfData)
    }
}

/// HTTP client for the catalog source.
///
/// All requests issued through [`Self::fetch_page`] and
/// [`Self::fetch_cast_for_show`] share one semaphore, so at most
/// `concurrency` requests are in flight regardless of how many tasks are
/// awaiting. A permit is held for the full retry loop of one unit of work.
pub struct TvMazeClient {
    client: Client,
    config: FetcherConfig,
    permits: Arc<Semaphore>,
}

impl TvMazeClient {
    /// Builds the client with the configured timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidBaseUrl`] if `config.base_url` does not
    /// parse, or [`FetchError::Http`] if the `reqwest::Client` cannot be
    /// constructed.
    pub fn new(mut config: FetcherConfig) -> Result<Self, FetchError> {
        config.base_url = config.base_url.trim_end_matches('/').to_owned();
        reqwest::Url::parse(&config.base_url).map_err(|e| FetchError::InvalidBaseUrl {
            base_url: config.base_url.clone(),
            reason: e.to_string(),
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&config.user_agent)
            .build()?;

        config.concurrency = config.concurrency.max(1);
        let permits = Arc::new(Semaphore::new(config.concurrency));

        Ok(Self {
            client,
            config,
            permits,
        })
    }

    #[must_use]
    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    fn shows_url(&self, page: u32) -> String {
        format!("{}/shows?page={page}", self.config.base_url)
    }

    fn cast_url(&self, show_id: i64) -> String {
        format!("{}/shows/{show_id}/cast", self.config.base_url)
    }

    /// Fetches one page of the show index in a single attempt.
    ///
    /// # Errors
    ///
    /// - [`FetchError::NotFound`] for HTTP 404 (past the last page).
    /// - [`FetchError::RateLimited`] for HTTP 429.
    /// - [`FetchError::UnexpectedStatus`] for any other non-2xx status.
    /// - [`FetchError::Http`] for network or timeout failures.
    /// - [`FetchError::Deserialize`] if the body is not a JSON array.
    ///
    /// Array items that do not decode as a show are skipped.
    pub async fn fetch_shows_page(&self, page: u32) -> Result<Vec<TvMazeShow>, FetchError> {
        let url = self.shows_url(page);
        let items: Vec<serde_json::Value> = self.get_json(url, format!("shows page {page}")).await?;
        Ok(decode_shows(page, items))
    }

    /// Fetches the cast list of one show in a single attempt.
    ///
    /// # Errors
    ///
    /// Same classification as [`Self::fetch_shows_page`]; 404 means the show
    /// has no cast resource.
    pub async fn fetch_show_cast(&self, show_id: i64) -> Result<Vec<TvMazeCastMember>, FetchError> {
        let url = self.cast_url(show_id);
        self.get_json(url, format!("cast for show {show_id}")).await
    }

    /// Fetches one page under the semaphore and retry policy, classifying
    /// the result. Never fails: exhausted retries become
    /// [`PageFetchResult::Failed`].
    pub async fn fetch_page(&self, page: u32) -> PageFetchResult {
        let _permit = match self.permits.acquire().await {
            Ok(permit) => permit,
            Err(e) => return PageFetchResult::Failed(e.into()),
        };

        let target = self.shows_url(page);
        match self
            .config
            .retry
            .run(&target, || self.fetch_shows_page(page))
            .await
        {
            RetryOutcome::Value(shows) => {
                tracing::debug!(page, count = shows.len(), "fetched shows page");
                PageFetchResult::Shows(shows)
            }
            RetryOutcome::Sentinel => {
                tracing::info!(page, "end of catalog reached");
                PageFetchResult::EndOfData
            }
            RetryOutcome::GaveUp(err) => {
                tracing::error!(
                    page,
                    error = %err,
                    "page fetch failed; continuing with empty page"
                );
                PageFetchResult::Failed(err)
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        context: String,
    ) -> Result<T, FetchError> {
        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound { url });
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(0);
            return Err(FetchError::RateLimited {
                url,
                retry_after_secs,
            });
        }

        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        serde_json::from_str::<T>(&body).map_err(|e| FetchError::Deserialize { context, source: e })
    }
}

/// Decodes each array item on its own so a single malformed record only
/// costs that record.
fn decode_shows(page: u32, items: Vec<serde_json::Value>) -> Vec<TvMazeShow> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<TvMazeShow>(item) {
            Ok(show) => Some(show),
            Err(e) => {
                tracing::warn!(page, index, error = %e, "skipping malformed show record");
                None
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
