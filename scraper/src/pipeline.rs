use std::thread;

use log::{debug, error, info, warn};

use crate::archive::{extract_entries, DatasetEntry};
use crate::config::ScrapeConfig;
use crate::details::extract_reaction_name;
use crate::fetch::Fetch;
use crate::identity::{resolve_dataset_id, DatasetId};
use crate::paginate::{walk_listing, Listing};
use crate::reaction::{parse_reaction, ReactionRecord};
use crate::store::{MergeOutcome, ReactionStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The archive page listed no datasets; nothing was scraped.
    NoEntries,
    Completed(RunSummary),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub datasets: usize,
    pub datasets_persisted: usize,
    /// Datasets dropped because no DOI could be resolved.
    pub datasets_skipped: usize,
    pub reactions_scraped: usize,
    pub reactions_persisted: usize,
    pub write_failures: usize,
}

/// Scrapes the archive dataset by dataset, saving after every reaction.
pub struct Pipeline<F: Fetch> {
    fetcher: F,
    config: ScrapeConfig,
}

impl<F: Fetch> Pipeline<F> {
    pub fn new(fetcher: F, config: ScrapeConfig) -> Self {
        Pipeline { fetcher, config }
    }

    /// Runs a whole scrape. Only failing to set up the output document is an
    /// error; everything after that is logged and skipped.
    pub fn run(&self) -> Result<RunOutcome, StoreError> {
        let mut store = if self.config.resume {
            ReactionStore::open(&self.config.output)?
        } else {
            ReactionStore::create_fresh(&self.config.output)?
        };

        let entries = self.load_archive();
        if entries.is_empty() {
            warn!("No entries found in archive {}", self.config.archive_url);
            return Ok(RunOutcome::NoEntries);
        }

        let limit = self.config.max_datasets.unwrap_or(entries.len());
        info!(
            "Found {} dataset(s), scraping {}",
            entries.len(),
            limit.min(entries.len())
        );

        let mut summary = RunSummary::default();
        for entry in entries.iter().take(limit) {
            self.scrape_dataset(entry, &mut store, &mut summary);
            thread::sleep(self.config.pacing.dataset);
        }

        if store.has_unflushed() {
            error!(
                "Last save to {} failed; the file holds the previous successful save",
                store.path().display()
            );
        }
        Ok(RunOutcome::Completed(summary))
    }

    fn load_archive(&self) -> Vec<DatasetEntry> {
        let url = &self.config.archive_url;
        match self.fetcher.fetch(url) {
            Ok(Some(html)) => extract_entries(&html, url),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to load archive page: {}", e);
                Vec::new()
            }
        }
    }

    fn scrape_dataset(&self, entry: &DatasetEntry, store: &mut ReactionStore, summary: &mut RunSummary) {
        info!("{}", entry.listing_url);

        let Listing {
            mut reactions,
            details_links,
            stop,
            ..
        } = walk_listing(&self.fetcher, &entry.listing_url, self.config.pacing.page);
        debug!("Listing ended: {:?}", stop);

        // every page is walked; the cap only limits what gets kept
        reactions.truncate(self.config.max_reactions);

        let dataset_id = resolve_dataset_id(&entry.listing_url, Some(entry));
        debug!("{} ({}) -> {}", entry.name, entry.year, dataset_id);

        summary.datasets += 1;
        summary.reactions_scraped += reactions.len();

        let lookup_names = self.config.fetch_names && dataset_id.is_resolved();
        let mut records: Vec<ReactionRecord> = Vec::with_capacity(reactions.len());
        for (index, raw) in reactions.iter().enumerate() {
            info!("Scraping Reaction-{}", index + 1);

            let name = if lookup_names {
                details_links
                    .get(index)
                    .and_then(Option::as_deref)
                    .and_then(|url| self.lookup_name(url))
            } else {
                None
            };
            records.push(parse_reaction(raw, index).with_name(name));

            self.persist(store, &dataset_id, &records, summary);
            thread::sleep(self.config.pacing.reaction);
        }

        match self.persist(store, &dataset_id, &records, summary) {
            Some(MergeOutcome::Written { reactions, .. }) => {
                summary.datasets_persisted += 1;
                summary.reactions_persisted += reactions;
            }
            Some(MergeOutcome::Skipped) => summary.datasets_skipped += 1,
            None => {}
        }
        info!("{}", "-".repeat(70));
    }

    fn persist(
        &self,
        store: &mut ReactionStore,
        dataset_id: &DatasetId,
        records: &[ReactionRecord],
        summary: &mut RunSummary,
    ) -> Option<MergeOutcome> {
        match store.merge_and_persist(dataset_id, records) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!("Error saving data: {}", e);
                summary.write_failures += 1;
                None
            }
        }
    }

    fn lookup_name(&self, details_url: &str) -> Option<String> {
        match self.fetcher.fetch(details_url) {
            Ok(Some(html)) => extract_reaction_name(&html),
            Ok(None) => None,
            Err(e) => {
                warn!("Could not fetch reaction details {}: {}", details_url, e);
                None
            }
        }
    }
}
