use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

use crate::app_config::AppConfig;
use crate::datasets::DEFAULT_DATASET_BASE_URL;
use crate::{ConfigError, DEFAULT_PRODUCT_STAGING_LIMIT};

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
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
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

    // Composed only when some POSTGRES_* identity is present, so fetch-only
    // environments build without database settings.
    let database_url = match lookup("DATABASE_URL") {
        Ok(url) => Some(url),
        Err(_) if lookup("POSTGRES_DB").is_ok() || lookup("POSTGRES_USER").is_ok() => {
            Some(database_url_from_parts(&lookup)?)
        }
        Err(_) => None,
    };

    let log_level = or_default("ALPHA_LOG_LEVEL", "info");
    let data_dir = PathBuf::from(or_default("ALPHA_DATA_DIR", "temp"));

    let mut dataset_base_url = or_default("ALPHA_DATASET_BASE_URL", DEFAULT_DATASET_BASE_URL);
    if !dataset_base_url.ends_with('/') {
        dataset_base_url.push('/');
    }

    let product_staging_limit = parse_usize(
        "ALPHA_PRODUCT_STAGING_LIMIT",
        &DEFAULT_PRODUCT_STAGING_LIMIT.to_string(),
    )?;
    let fetch_timeout_secs = parse_u64("ALPHA_FETCH_TIMEOUT_SECS", "30")?;
    let fetch_user_agent = or_default("ALPHA_FETCH_USER_AGENT", "alpha-loader/0.1");
    let db_acquire_timeout_secs = parse_u64("ALPHA_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        database_url,
        log_level,
        data_dir,
        dataset_base_url,
        product_staging_limit,
        fetch_timeout_secs,
        fetch_user_agent,
        db_acquire_timeout_secs,
    })
}

/// Assemble a Postgres URL from the discrete `POSTGRES_*` variables.
///
/// Credentials are percent-encoded so passwords containing `@` or `/` survive.
fn database_url_from_parts<F>(lookup: &F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let host = lookup("POSTGRES_HOST").unwrap_or_else(|_| "localhost".to_string());
    let raw_port = lookup("POSTGRES_PORT").unwrap_or_else(|_| "5432".to_string());
    let port = raw_port
        .parse::<u16>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "POSTGRES_PORT".to_string(),
            reason: e.to_string(),
        })?;
    let database = require("POSTGRES_DB")?;
    let user = require("POSTGRES_USER")?;
    let password = lookup("POSTGRES_PASSWORD").unwrap_or_default();

    let encoded_user = utf8_percent_encode(&user, NON_ALPHANUMERIC);
    let credentials = if password.is_empty() {
        encoded_user.to_string()
    } else {
        format!(
            "{encoded_user}:{}",
            utf8_percent_encode(&password, NON_ALPHANUMERIC)
        )
    };

    Ok(format!("postgres://{credentials}@{host}:{port}/{database}"))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
