mod import;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "alpha-loader")]
#[command(about = "Seed the catalog database from the alpha CSV snapshots")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Download any missing CSV snapshots into the data directory
    Fetch,
    /// Fetch, load reference tables, stage products, then load variants
    Import {
        /// Use the CSV files already on disk without contacting the dataset host
        #[arg(long)]
        skip_fetch: bool,
        /// Override how many products (from the top of products.csv) are staged
        #[arg(long)]
        staging_limit: Option<usize>,
    },
    /// Database utilities
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check that the database is reachable
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = alpha_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Some(Commands::Fetch) => {
            let summary = import::run_fetch(&config).await?;
            println!(
                "fetched {} datasets ({} already present)",
                summary.downloaded.len(),
                summary.already_present.len()
            );
        }
        Some(Commands::Import {
            skip_fetch,
            staging_limit,
        }) => {
            let pool = connect(&config).await?;
            let options = import::ImportOptions {
                skip_fetch,
                staging_limit: staging_limit.unwrap_or(config.product_staging_limit),
            };
            let summary = import::run_import(&pool, &config, &options).await?;
            summary.print();
        }
        Some(Commands::Db {
            command: DbCommands::Ping,
        }) => {
            let pool = connect(&config).await?;
            alpha_db::ping(&pool).await?;
            println!("database reachable");
        }
        None => println!("alpha-loader: run `alpha-loader import` to seed the catalog"),
    }

    Ok(())
}

async fn connect(config: &alpha_core::AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = alpha_db::PoolConfig::from_app_config(config);
    let database_url = config.require_database_url()?;
    let pool = alpha_db::connect_pool(database_url, pool_config).await?;
    Ok(pool)
}
