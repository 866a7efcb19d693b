use std::path::PathBuf;

use crate::ConfigError;

#[derive(Clone)]
pub struct AppConfig {
    /// `None` when no database settings are present; only commands that
    /// touch storage ask for it, via [`AppConfig::require_database_url`].
    pub database_url: Option<String>,
    pub log_level: String,
    /// Directory the raw CSV snapshots are materialized into.
    pub data_dir: PathBuf,
    /// Remote directory the snapshots are downloaded from; always ends with `/`.
    pub dataset_base_url: String,
    pub product_staging_limit: usize,
    pub fetch_timeout_secs: u64,
    pub fetch_user_agent: String,
    pub db_acquire_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field("log_level", &self.log_level)
            .field("data_dir", &self.data_dir)
            .field("dataset_base_url", &self.dataset_base_url)
            .field("product_staging_limit", &self.product_staging_limit)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("fetch_user_agent", &self.fetch_user_agent)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}

impl AppConfig {
    /// Returns the database URL, or `MissingEnvVar("DATABASE_URL")` when the
    /// environment carried no database settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] if no URL was configured.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))
    }
}
