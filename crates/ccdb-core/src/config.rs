use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Default source host; overridable so tests can point at a mock server.
pub const DEFAULT_SCRAPER_BASE_URL: &str = "http://www.odjfs.state.oh.us";

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

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("CCDB_ENV", "development"))?;
    let log_level = or_default("CCDB_LOG_LEVEL", "info");
    let counties_path = PathBuf::from(or_default("CCDB_COUNTIES_PATH", "./config/counties.yaml"));

    let db_max_connections = parse_u32("CCDB_DB_MAX_CONNECTIONS", "5")?;
    let db_min_connections = parse_u32("CCDB_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("CCDB_DB_ACQUIRE_TIMEOUT_SECS", "10")?;
    if db_min_connections > db_max_connections {
        return Err(ConfigError::InvalidEnvVar {
            var: "CCDB_DB_MIN_CONNECTIONS".to_string(),
            reason: format!(
                "{db_min_connections} exceeds CCDB_DB_MAX_CONNECTIONS ({db_max_connections})"
            ),
        });
    }

    let scraper_base_url = or_default("CCDB_SCRAPER_BASE_URL", DEFAULT_SCRAPER_BASE_URL);
    let scraper_user_agent = or_default("CCDB_SCRAPER_USER_AGENT", "ccdb/0.1 (child-care-sync)");
    let scraper_request_timeout_secs = parse_u64("CCDB_SCRAPER_REQUEST_TIMEOUT_SECS", "30")?;

    let sleep_min_ms = parse_u64("CCDB_SLEEP_MIN_MS", "0")?;
    let sleep_max_ms = parse_u64("CCDB_SLEEP_MAX_MS", "500")?;
    if sleep_min_ms > sleep_max_ms {
        return Err(ConfigError::InvalidEnvVar {
            var: "CCDB_SLEEP_MIN_MS".to_string(),
            reason: format!("{sleep_min_ms} exceeds CCDB_SLEEP_MAX_MS ({sleep_max_ms})"),
        });
    }
    let tick_timeout_secs = parse_u64("CCDB_TICK_TIMEOUT_SECS", "120")?;

    let mapquest_api_key = lookup("CCDB_MAPQUEST_API_KEY")
        .ok()
        .filter(|key| !key.trim().is_empty());
    let geocode_batch_size = parse_usize("CCDB_GEOCODE_BATCH_SIZE", "25")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        counties_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        scraper_base_url,
        scraper_user_agent,
        scraper_request_timeout_secs,
        sleep_min_ms,
        sleep_max_ms,
        tick_timeout_secs,
        mapquest_api_key,
        geocode_batch_size,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "CCDB_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
