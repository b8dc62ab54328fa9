use crate::app_config::{AppConfig, Environment, StatusStoreKind};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

fn invalid(var: &str, reason: impl ToString) -> ConfigError {
    ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: reason.to_string(),
    }
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_num = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = parse_num(var, default)?;
        u32::try_from(raw).map_err(|e| invalid(var, e))
    };

    let parse_positive = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let value = parse_num(var, default)?;
        if value == 0 {
            return Err(invalid(var, "must be greater than zero"));
        }
        Ok(value)
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("SHOWPIPE_ENV", "development"))?;

    let bind_addr = or_default("SHOWPIPE_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("SHOWPIPE_BIND_ADDR", e))?;
    let log_level = or_default("SHOWPIPE_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("SHOWPIPE_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("SHOWPIPE_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_num("SHOWPIPE_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let tvmaze_base_url = or_default("SHOWPIPE_TVMAZE_BASE_URL", "https://api.tvmaze.com")
        .trim_end_matches('/')
        .to_string();
    let http_timeout_secs = parse_positive("SHOWPIPE_HTTP_TIMEOUT_SECS", "15")?;
    let user_agent = or_default("SHOWPIPE_USER_AGENT", "showpipe/0.1 (catalog-ingest)");

    let fetch_concurrency = usize::try_from(parse_positive("SHOWPIPE_FETCH_CONCURRENCY", "5")?)
        .map_err(|e| invalid("SHOWPIPE_FETCH_CONCURRENCY", e))?;
    let fetch_max_attempts = u32::try_from(parse_positive("SHOWPIPE_FETCH_MAX_ATTEMPTS", "3")?)
        .map_err(|e| invalid("SHOWPIPE_FETCH_MAX_ATTEMPTS", e))?;
    let retry_backoff_base_ms = parse_num("SHOWPIPE_RETRY_BACKOFF_BASE_MS", "1500")?;
    let inter_batch_delay_ms = parse_num("SHOWPIPE_INTER_BATCH_DELAY_MS", "500")?;
    let estimated_total_pages =
        u32::try_from(parse_positive("SHOWPIPE_ESTIMATED_TOTAL_PAGES", "350")?)
            .map_err(|e| invalid("SHOWPIPE_ESTIMATED_TOTAL_PAGES", e))?;
    let max_pages = u32::try_from(parse_positive("SHOWPIPE_MAX_PAGES", "2000")?)
        .map_err(|e| invalid("SHOWPIPE_MAX_PAGES", e))?;

    let default_lookback_years = or_default("SHOWPIPE_DEFAULT_LOOKBACK_YEARS", "10")
        .parse::<i64>()
        .map_err(|e| invalid("SHOWPIPE_DEFAULT_LOOKBACK_YEARS", e))
        .and_then(|years| {
            crate::validate_lookback_years(years)
                .map_err(|e| invalid("SHOWPIPE_DEFAULT_LOOKBACK_YEARS", e))
        })?;

    let status_store = parse_status_store(&or_default("SHOWPIPE_STATUS_STORE", "memory"))?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        tvmaze_base_url,
        http_timeout_secs,
        user_agent,
        fetch_concurrency,
        fetch_max_attempts,
        retry_backoff_base_ms,
        inter_batch_delay_ms,
        estimated_total_pages,
        max_pages,
        default_lookback_years,
        status_store,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(invalid(
            "SHOWPIPE_ENV",
            format!("expected development, test, or production; got \"{other}\""),
        )),
    }
}

fn parse_status_store(s: &str) -> Result<StatusStoreKind, ConfigError> {
    match s {
        "memory" => Ok(StatusStoreKind::Memory),
        "postgres" => Ok(StatusStoreKind::Postgres),
        other => Err(invalid(
            "SHOWPIPE_STATUS_STORE",
            format!("expected memory or postgres; got \"{other}\""),
        )),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
