pub mod app_config;
pub mod config;
pub mod datasets;
pub mod records;
pub mod variants;

use std::path::PathBuf;

use thiserror::Error;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use datasets::{dataset_sources, parse_csv, read_csv, Dataset, DatasetSource};
pub use records::{Category, Color, Product, ProductVariant, RawVariantRecord, Size};
pub use variants::{
    filter_staged, normalize_image_name, synthetic_price, uuid_from_rng, StagedVariant,
    VariantDeriver, IMAGE_PREFIX, PRICE_RANGE,
};

/// Number of products loaded from the head of `products.csv`.
pub const DEFAULT_PRODUCT_STAGING_LIMIT: usize = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to read CSV {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
