//! CLI entry point for the Census ACS ETL job.
//!
//! Runs the full fetch → rename → upload pipeline against S3 (or a local
//! directory), fetches a single column spec for inspection, or lists the
//! configured datasets.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use census_etl::census::CensusClient;
use census_etl::config::{EtlConfig, bucket_from_env};
use census_etl::dataset::{DatasetSummary, default_datasets};
use census_etl::fetch::BasicClient;
use census_etl::pipeline::{InvocationResult, Pipeline, RunReport};
use census_etl::storage::{LocalStore, S3Store};
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(name = "census_etl")]
#[command(about = "Load Census ACS 5-year state statistics into S3 as CSV", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every dataset, rename its columns and upload it
    Run {
        /// Years to fetch, comma separated (overrides CENSUS_YEARS)
        #[arg(short, long, value_delimiter = ',')]
        years: Option<Vec<String>>,

        /// Destination bucket (overrides CENSUS_BUCKET)
        #[arg(short, long)]
        bucket: Option<String>,

        /// Census API base URL (overrides CENSUS_API_BASE_URL)
        #[arg(long)]
        base_url: Option<String>,

        /// Write objects under this directory instead of uploading to S3
        #[arg(long, value_name = "DIR")]
        local_dir: Option<PathBuf>,
    },
    /// Fetch one column spec across years and print it as CSV
    Fetch {
        /// Comma-joined Census variable ids, e.g. "NAME" or "DP03_0062E"
        #[arg(short, long)]
        columns: String,

        /// Years to fetch, comma separated (overrides CENSUS_YEARS)
        #[arg(short, long, value_delimiter = ',')]
        years: Option<Vec<String>>,

        /// File to write instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the datasets a run publishes
    Datasets {
        /// Destination bucket (overrides CENSUS_BUCKET)
        #[arg(short, long)]
        bucket: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _log_guard = census_etl::logging::init_cli();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            years,
            bucket,
            base_url,
            local_dir,
        } => {
            let mut config = EtlConfig::from_env()?;
            if let Some(years) = years {
                config.override_years(&years)?;
            }
            if let Some(bucket) = bucket {
                config.bucket = bucket;
            }
            if let Some(base_url) = base_url {
                config.api.base_url = base_url;
            }

            let report = run(&config, local_dir).await?;
            let result = InvocationResult::success(&report)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Fetch {
            columns,
            years,
            output,
        } => {
            let mut config = EtlConfig::from_env()?;
            if let Some(years) = years {
                config.override_years(&years)?;
            }

            let http = BasicClient::new(config.api.timeout, config.api.connect_timeout)?;
            let census = CensusClient::new(http, &config.api);
            let table = census.fetch(&columns, &config.years).await?;
            let csv = table.to_csv()?;

            match output {
                Some(path) => {
                    std::fs::write(&path, &csv)
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!(path = %path.display(), rows = table.len(), "CSV written");
                }
                None => std::io::stdout().write_all(&csv)?,
            }
        }
        Commands::Datasets { bucket } => {
            let bucket = bucket.unwrap_or_else(bucket_from_env);
            let datasets = default_datasets(&bucket);
            let summaries: Vec<DatasetSummary> =
                datasets.iter().map(DatasetSummary::from).collect();
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
    }

    Ok(())
}

/// Builds the pipeline for `config` and runs it against S3, or against
/// `local_dir` when one is given.
#[tracing::instrument(skip(config), fields(bucket = %config.bucket))]
async fn run(config: &EtlConfig, local_dir: Option<PathBuf>) -> Result<RunReport> {
    let http = BasicClient::new(config.api.timeout, config.api.connect_timeout)?;
    let census = CensusClient::new(http, &config.api);
    let datasets = default_datasets(&config.bucket);
    let years = config.years.clone();

    let report = match local_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "Writing objects to local directory");
            Pipeline::new(census, LocalStore::new(dir), years, datasets)
                .run()
                .await?
        }
        None => {
            let store = S3Store::from_env().await;
            Pipeline::new(census, store, years, datasets).run().await?
        }
    };

    Ok(report)
}
