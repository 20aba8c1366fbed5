use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crd_scraper::config::{DEFAULT_ARCHIVE_URL, DEFAULT_MAX_REACTIONS, DEFAULT_OUTPUT_FILE};
use crd_scraper::{FetchConfig, HttpFetcher, Pipeline, RunOutcome, ScrapeConfig};

/// CRD scraper for the Chemical Reaction Database archive
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Archive page URL
    #[arg(long, default_value = DEFAULT_ARCHIVE_URL)]
    archive_url: String,

    /// Maximum number of datasets to scrape
    #[arg(long)]
    max_datasets: Option<usize>,

    /// Maximum reactions to keep per dataset
    #[arg(long, default_value_t = DEFAULT_MAX_REACTIONS)]
    max_reactions_per_dataset: usize,

    /// JSON document to write
    #[arg(long, default_value = DEFAULT_OUTPUT_FILE)]
    output: PathBuf,

    /// Merge into the existing document instead of starting from scratch
    #[arg(long)]
    resume: bool,

    /// Skip fetching reaction names from the details pages
    #[arg(long)]
    no_names: bool,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Attempts per request for connection errors and timeouts
    #[arg(long, default_value_t = 3)]
    retries: u32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let fetch_config = FetchConfig {
        timeout: Duration::from_secs(cli.timeout_secs),
        max_attempts: cli.retries,
        ..FetchConfig::default()
    };
    let fetcher = HttpFetcher::new(fetch_config).context("Failed to create HTTP client")?;

    let config = ScrapeConfig {
        archive_url: cli.archive_url,
        output: cli.output,
        max_datasets: cli.max_datasets,
        max_reactions: cli.max_reactions_per_dataset,
        fetch_names: !cli.no_names,
        resume: cli.resume,
        ..ScrapeConfig::default()
    };
    let output = config.output.clone();

    let outcome = Pipeline::new(fetcher, config)
        .run()
        .with_context(|| format!("Failed to prepare {}", output.display()))?;

    match outcome {
        RunOutcome::NoEntries => {
            println!("✗ No entries found in archive");
        }
        RunOutcome::Completed(summary) => {
            println!(
                "\nScraped {} dataset(s): {} saved, {} without a DOI",
                summary.datasets, summary.datasets_persisted, summary.datasets_skipped
            );
            println!(
                "{} reaction(s) scraped, {} saved to {}",
                summary.reactions_scraped,
                summary.reactions_persisted,
                output.display()
            );
            if summary.write_failures > 0 {
                println!("⚠️ {} save(s) failed along the way", summary.write_failures);
            }
        }
    }

    Ok(())
}
