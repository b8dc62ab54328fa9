use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Backend used for the per-run status blackboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusStoreKind {
    /// Process-local map; statuses vanish on restart.
    Memory,
    /// `pipeline_run_status` table, shared by every process on the database.
    Postgres,
}

impl std::fmt::Display for StatusStoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusStoreKind::Memory => write!(f, "memory"),
            StatusStoreKind::Postgres => write!(f, "postgres"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub tvmaze_base_url: String,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    pub fetch_concurrency: usize,
    pub fetch_max_attempts: u32,
    pub retry_backoff_base_ms: u64,
    pub inter_batch_delay_ms: u64,
    pub estimated_total_pages: u32,
    pub max_pages: u32,
    pub default_lookback_years: u16,
    pub status_store: StatusStoreKind,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("tvmaze_base_url", &self.tvmaze_base_url)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("fetch_concurrency", &self.fetch_concurrency)
            .field("fetch_max_attempts", &self.fetch_max_attempts)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("inter_batch_delay_ms", &self.inter_batch_delay_ms)
            .field("estimated_total_pages", &self.estimated_total_pages)
            .field("max_pages", &self.max_pages)
            .field("default_lookback_years", &self.default_lookback_years)
            .field("status_store", &self.status_store)
            .finish()
    }
}
