//! Materializes the raw CSV snapshots on local disk.
//!
//! A destination that already exists is trusted as-is: there is no checksum,
//! no freshness check and no retry. Downloads land in a `.part` file that is
//! renamed into place once complete, so an interrupted run never leaves a
//! truncated file that later runs would mistake for a finished one.

use std::path::{Path, PathBuf};
use std::time::Duration;

use alpha_core::{Dataset, DatasetSource};
use reqwest::Client;

use crate::error::FetchError;

/// Which datasets were downloaded and which were already on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub downloaded: Vec<Dataset>,
    pub already_present: Vec<Dataset>,
}

/// HTTP client for the plain-file dataset host.
pub struct DatasetFetcher {
    client: Client,
}

impl DatasetFetcher {
    /// Creates a `DatasetFetcher` with configured timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Ensures every `sources[i].path` exists, downloading the missing ones
    /// in order.
    ///
    /// # Errors
    ///
    /// Stops at the first failed download. Files fetched before it stay on
    /// disk.
    pub async fn ensure_datasets(
        &self,
        sources: &[DatasetSource],
    ) -> Result<FetchSummary, FetchError> {
        let mut summary = FetchSummary::default();

        for source in sources {
            if tokio::fs::try_exists(&source.path)
                .await
                .map_err(|e| io_error(&source.path, e))?
            {
                tracing::debug!(
                    dataset = %source.dataset,
                    path = %source.path.display(),
                    "dataset already present; skipping download"
                );
                summary.already_present.push(source.dataset);
                continue;
            }

            let bytes = self.download(&source.url).await?;
            write_atomically(&source.path, &bytes).await?;
            tracing::info!(
                dataset = %source.dataset,
                url = %source.url,
                path = %source.path.display(),
                bytes = bytes.len(),
                "downloaded dataset"
            );
            summary.downloaded.push(source.dataset);
        }

        Ok(summary)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound {
                url: url.to_owned(),
            });
        }

        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), FetchError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| io_error(parent, e))?;
    }

    let partial = partial_path(path);
    tokio::fs::write(&partial, bytes)
        .await
        .map_err(|e| io_error(&partial, e))?;
    tokio::fs::rename(&partial, path)
        .await
        .map_err(|e| io_error(path, e))
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

fn io_error(path: &Path, source: std::io::Error) -> FetchError {
    FetchError::Io {
        path: path.to_path_buf(),
        source,
    }
}
