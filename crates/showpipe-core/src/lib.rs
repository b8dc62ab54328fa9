mod app_config;
mod config;
pub mod shows;

pub use app_config::{AppConfig, Environment, StatusStoreKind};
pub use config::{load_app_config, load_app_config_from_env};
pub use shows::{
    validate_lookback_years, NewCastEntry, NewShow, TopShowCriteria, MAX_LOOKBACK_YEARS,
    TOP_SHOWS_LIMIT,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("lookback years must be between 0 and {max}, got {value}")]
    InvalidLookbackYears { value: i64, max: u16 },
}
