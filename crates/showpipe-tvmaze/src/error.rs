use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by {url} (retry after {retry_after_secs}s)")]
    RateLimited { url: String, retry_after_secs: u64 },

    #[error("resource not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("pagination limit reached: no end-of-data response within {max_pages} pages")]
    PaginationLimit { max_pages: u32 },

    #[error("invalid base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },

    #[error("request permits unavailable: {0}")]
    PermitsClosed(#[from] tokio::sync::AcquireError),
}

impl FetchError {
    /// `true` for conditions worth retrying after a backoff delay: network
    /// failures, timeouts, HTTP 429, and HTTP 5xx.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            FetchError::Http(_) | FetchError::RateLimited { .. } => true,
            FetchError::UnexpectedStatus { status, .. } => (500..600).contains(status),
            FetchError::Deserialize { .. }
            | FetchError::NotFound { .. }
            | FetchError::PaginationLimit { .. }
            | FetchError::InvalidBaseUrl { .. }
            | FetchError::PermitsClosed(_) => false,
        }
    }

    /// `true` for the source's "not found" response, which callers interpret
    /// as end-of-data for pages and as "no cast" for a single show.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }
}
