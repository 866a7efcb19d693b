//! The fixed set of CSV snapshots the catalog is seeded from, and helpers to
//! read them into typed records.

use std::io::Read;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::CoreError;

pub const DEFAULT_DATASET_BASE_URL: &str =
    "https://raw.githubusercontent.com/MemCommerce/memcommerce-docs/refs/heads/main/datasets/alpha/";

/// One of the five snapshots making up the alpha dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Categories,
    Colors,
    Sizes,
    Products,
    ProductVariants,
}

impl Dataset {
    pub const ALL: [Dataset; 5] = [
        Dataset::Categories,
        Dataset::Colors,
        Dataset::ProductVariants,
        Dataset::Products,
        Dataset::Sizes,
    ];

    /// File name on the remote host.
    #[must_use]
    pub fn remote_file_name(self) -> &'static str {
        match self {
            Dataset::ProductVariants => "product_variants_with_sizes.csv",
            other => other.local_file_name(),
        }
    }

    /// File name inside the local data directory.
    #[must_use]
    pub fn local_file_name(self) -> &'static str {
        match self {
            Dataset::Categories => "categories.csv",
            Dataset::Colors => "colors.csv",
            Dataset::Sizes => "sizes.csv",
            Dataset::Products => "products.csv",
            Dataset::ProductVariants => "product_variants.csv",
        }
    }

    #[must_use]
    pub fn local_path(self, data_dir: &Path) -> PathBuf {
        data_dir.join(self.local_file_name())
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dataset::Categories => write!(f, "categories"),
            Dataset::Colors => write!(f, "colors"),
            Dataset::Sizes => write!(f, "sizes"),
            Dataset::Products => write!(f, "products"),
            Dataset::ProductVariants => write!(f, "product_variants"),
        }
    }
}

/// A (source URL, destination path) pair handed to the fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSource {
    pub dataset: Dataset,
    pub url: String,
    pub path: PathBuf,
}

/// Builds the source list for every dataset. `base_url` must end with `/`.
#[must_use]
pub fn dataset_sources(base_url: &str, data_dir: &Path) -> Vec<DatasetSource> {
    Dataset::ALL
        .iter()
        .map(|&dataset| DatasetSource {
            dataset,
            url: format!("{base_url}{}", dataset.remote_file_name()),
            path: dataset.local_path(data_dir),
        })
        .collect()
}

/// Deserializes every row of a headed CSV stream.
///
/// Fields are trimmed; empty fields become `None` for `Option` columns.
///
/// # Errors
///
/// Returns the first [`csv::Error`] hit, whether structural or a type mismatch.
pub fn parse_csv<T, R>(reader: R) -> Result<Vec<T>, csv::Error>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    csv_reader.deserialize().collect()
}

/// Reads and deserializes a CSV file from disk.
///
/// # Errors
///
/// Returns [`CoreError::Csv`] if the file cannot be opened or any row fails
/// to parse.
pub fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, CoreError> {
    let to_err = |source| CoreError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let file = std::fs::File::open(path).map_err(|e| to_err(csv::Error::from(e)))?;
    let rows = parse_csv(std::io::BufReader::new(file)).map_err(to_err)?;
    tracing::debug!(path = %path.display(), rows = rows.len(), "read CSV");
    Ok(rows)
}
