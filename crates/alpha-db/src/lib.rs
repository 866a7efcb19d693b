use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;

pub mod reference;
pub mod variants;

pub use reference::{
    load_categories, load_colors, load_sizes, stage_products, staged_product_ids,
};
pub use variants::{
    insert_variant, load_variants_isolated, RowFailure, VariantLoadReport, VariantSink,
};

// The import holds exactly one connection for its whole run.
const DEFAULT_MAX_CONNECTIONS: u32 = 1;
const DEFAULT_MIN_CONNECTIONS: u32 = 0;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &alpha_core::AppConfig) -> Self {
        Self {
            acquire_timeout_secs: config.db_acquire_timeout_secs,
            ..Self::default()
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DbError {
    /// `true` when the database refused this one statement's data and the
    /// connection is still usable: integrity violations (SQLSTATE class 23),
    /// data exceptions (class 22), or a value that could not be encoded.
    ///
    /// Everything else (I/O, pool, TLS, protocol, connection-class or
    /// schema-level SQLSTATEs) is treated as fatal for the run.
    #[must_use]
    pub fn is_row_rejection(&self) -> bool {
        match self {
            DbError::Sqlx(sqlx::Error::Database(db_err)) => db_err
                .code()
                .is_some_and(|code| code.starts_with("23") || code.starts_with("22")),
            DbError::Sqlx(sqlx::Error::Encode(_)) => true,
            _ => false,
        }
    }
}

/// Connect to a Postgres pool using explicit URL and config.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the connection cannot be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Send a `SELECT 1` to verify the pool has a live connection.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}
