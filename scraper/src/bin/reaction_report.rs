use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crd_scraper::config::DEFAULT_OUTPUT_FILE;
use crd_scraper::load_document;
use crd_scraper::report::summarize;

/// Prints how many reactions each dataset in a scraped document holds
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Scraped JSON document
    #[arg(default_value = DEFAULT_OUTPUT_FILE)]
    file: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let document = load_document(&cli.file)
        .with_context(|| format!("Failed to load {}", cli.file.display()))?;
    println!("{}", summarize(&document));

    Ok(())
}
