//! Import command handlers: fetch → reference load → variant load.
//!
//! Every input file is parsed before the first write, so a malformed CSV
//! aborts the run with the database untouched. Reference tables and the staged
//! product subset are loaded table by table; variants are then filtered to the
//! staged products and inserted one row at a time. A variant row the database
//! rejects is logged and skipped; any other failure aborts the run and leaves
//! already-committed rows in place.

use std::collections::HashSet;

use alpha_core::{
    dataset_sources, filter_staged, read_csv, AppConfig, Category, Color, Dataset, Product,
    RawVariantRecord, Size, VariantDeriver,
};
use alpha_db::{DbError, VariantLoadReport, VariantSink};
use alpha_fetch::{DatasetFetcher, FetchSummary};
use rand::Rng;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub(crate) struct ImportOptions {
    pub skip_fetch: bool,
    pub staging_limit: usize,
}

/// Counts for the variant stage of an import.
#[derive(Debug, Clone, Default)]
pub(crate) struct VariantStageSummary {
    /// Rows read from `product_variants.csv`.
    pub read: usize,
    /// Rows dropped because their product is not staged.
    pub filtered_out: usize,
    pub load: VariantLoadReport,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ImportSummary {
    pub fetch: Option<FetchSummary>,
    pub categories: u64,
    pub colors: u64,
    pub sizes: u64,
    pub products: u64,
    pub variants: VariantStageSummary,
}

impl ImportSummary {
    pub(crate) fn print(&self) {
        if let Some(fetch) = &self.fetch {
            println!(
                "fetched {} datasets ({} already present)",
                fetch.downloaded.len(),
                fetch.already_present.len()
            );
        }
        println!(
            "loaded {} categories, {} colors, {} sizes, {} products",
            self.categories, self.colors, self.sizes, self.products
        );
        let v = &self.variants;
        println!(
            "variants: {} read, {} filtered out, {} inserted, {} skipped",
            v.read,
            v.filtered_out,
            v.load.inserted,
            v.load.skipped()
        );
    }
}

/// Ensure every dataset file exists under `config.data_dir`.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built or any missing dataset
/// fails to download.
pub(crate) async fn run_fetch(config: &AppConfig) -> anyhow::Result<FetchSummary> {
    let fetcher = DatasetFetcher::new(config.fetch_timeout_secs, &config.fetch_user_agent)?;
    let sources = dataset_sources(&config.dataset_base_url, &config.data_dir);
    let summary = fetcher.ensure_datasets(&sources).await?;
    tracing::info!(
        downloaded = summary.downloaded.len(),
        already_present = summary.already_present.len(),
        data_dir = %config.data_dir.display(),
        "datasets ready"
    );
    Ok(summary)
}

/// Run the full import against `pool` using one held connection.
///
/// # Errors
///
/// Returns an error on fetch failure, unreadable or malformed CSV, any
/// reference-table failure, or a non-row-local database error during the
/// variant load. Variant rows already committed stay committed.
pub(crate) async fn run_import(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    options: &ImportOptions,
) -> anyhow::Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    if options.skip_fetch {
        tracing::info!("skipping dataset fetch");
    } else {
        summary.fetch = Some(run_fetch(config).await?);
    }

    let dir = &config.data_dir;
    let categories: Vec<Category> = read_csv(&Dataset::Categories.local_path(dir))?;
    let colors: Vec<Color> = read_csv(&Dataset::Colors.local_path(dir))?;
    let sizes: Vec<Size> = read_csv(&Dataset::Sizes.local_path(dir))?;
    let products: Vec<Product> = read_csv(&Dataset::Products.local_path(dir))?;
    let raw_variants: Vec<RawVariantRecord> =
        read_csv(&Dataset::ProductVariants.local_path(dir))?;

    let mut conn = pool.acquire().await?;

    summary.categories = alpha_db::load_categories(&mut conn, &categories).await?;
    summary.colors = alpha_db::load_colors(&mut conn, &colors).await?;
    summary.sizes = alpha_db::load_sizes(&mut conn, &sizes).await?;
    summary.products =
        alpha_db::stage_products(&mut conn, &products, options.staging_limit).await?;

    let staged = alpha_db::staged_product_ids(&mut conn).await?;
    let mut deriver = VariantDeriver::from_os_rng();
    summary.variants = load_variant_stage(&mut *conn, raw_variants, &staged, &mut deriver).await?;

    let load = &summary.variants.load;
    if load.skipped() > 0 {
        tracing::warn!(
            skipped = load.skipped(),
            inserted = load.inserted,
            "some variant rows were rejected; see warnings above"
        );
    }
    tracing::info!(
        read = summary.variants.read,
        filtered_out = summary.variants.filtered_out,
        inserted = load.inserted,
        "variant load finished"
    );

    Ok(summary)
}

/// Filter `raw` to `staged` products, derive synthetic fields, and insert
/// through `sink` with per-row isolation.
///
/// # Errors
///
/// Propagates the first error that is not a row rejection.
pub(crate) async fn load_variant_stage<S, R, I>(
    sink: &mut S,
    raw: Vec<RawVariantRecord>,
    staged: &HashSet<String>,
    deriver: &mut VariantDeriver<R, I>,
) -> Result<VariantStageSummary, DbError>
where
    S: VariantSink,
    R: Rng,
    I: FnMut() -> Uuid,
{
    let read = raw.len();
    let derived = deriver.derive_all(filter_staged(raw, staged));
    let load = alpha_db::load_variants_isolated(sink, derived).await?;

    Ok(VariantStageSummary {
        read,
        filtered_out: read - load.attempted,
        load,
    })
}

#[cfg(test)]
#[path = "import_test.rs"]
mod tests;
