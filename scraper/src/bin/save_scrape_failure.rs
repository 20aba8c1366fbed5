use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use crd_scraper::details::extract_details_links;
use crd_scraper::paginate::find_next_page;
use crd_scraper::reactions::{extract_reactions_with_report, SMILES_ATTR};
use crd_scraper::{Fetch, FetchConfig, HttpFetcher};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Get URL from command line arguments
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        eprintln!("Please provide a listing URL and a test name");
        eprintln!("Usage: cargo run --bin save_scrape_failure <URL> <test_name>");
        std::process::exit(1);
    }

    let url = &args[1];
    let test_name = &args[2];

    println!("Fetching HTML from {}...", url);

    let fetcher = HttpFetcher::new(FetchConfig::default()).context("Failed to create HTTP client")?;
    let html = match fetcher.fetch(url).context("Failed to fetch listing page")? {
        Some(html) => html,
        None => {
            eprintln!("{} returned 404, nothing to save", url);
            std::process::exit(1);
        }
    };

    // Create failures directory if it doesn't exist
    let failures_dir = Path::new("src/tests/fixtures/failures");
    fs::create_dir_all(failures_dir).context("Failed to create failures directory")?;

    // Save the HTML for testing
    let file_path = failures_dir.join(format!("{}.html", test_name));
    fs::write(&file_path, &html).context("Failed to write HTML file")?;

    println!(
        "Saved HTML to {} for regression testing",
        file_path.display()
    );

    // An empty result is ambiguous: the dataset may really be empty, or the
    // markup may have moved away from every selector we know.
    let report = extract_reactions_with_report(&html);
    println!("\nExtraction strategies:");
    for (strategy, count) in &report.contributions {
        println!("  - {}: {}", strategy, count);
    }

    let has_panes = html.contains("reaction-pane-");
    let has_smiles_attr = html.contains(SMILES_ATTR);
    let has_push_calls = html.contains("reactions.push");
    let details = extract_details_links(&html, url);
    let document = scraper::Html::parse_document(&html);
    let next = find_next_page(&document, url);

    println!("\nHTML analysis results:");
    println!("  - Has reaction panes: {}", has_panes);
    println!("  - Has {} attributes: {}", SMILES_ATTR, has_smiles_attr);
    println!("  - Has reactions.push calls: {}", has_push_calls);
    println!(
        "  - Details links: {} of {}",
        details.iter().flatten().count(),
        details.len()
    );
    println!("  - Next page: {}", next.as_deref().unwrap_or("none"));

    if report.reactions.is_empty() {
        if has_panes || has_smiles_attr || has_push_calls {
            println!("✅ No reactions extracted although reaction markup is present - selectors look stale");
        } else {
            println!("   No reaction markup at all - the listing is probably empty");
        }
    } else {
        println!(
            "⚠️ Extracted {} reaction(s). This may not be a failure case.",
            report.reactions.len()
        );
    }

    Ok(())
}
