pub mod archive;
pub mod config;
pub mod details;
pub mod fetch;
pub mod html;
pub mod identity;
pub mod paginate;
pub mod pipeline;
pub mod reaction;
pub mod reactions;
pub mod report;
pub mod store;

// Fixture-driven tests for the extraction and persistence stages
#[cfg(test)]
pub mod tests;

// Re-export key types and functions for easier access
pub use crate::archive::{extract_entries, DatasetEntry};
pub use crate::config::{FetchConfig, Pacing, ScrapeConfig};
pub use crate::fetch::{Fetch, FetchError, HttpFetcher};
pub use crate::identity::{resolve_dataset_id, DatasetId};
pub use crate::paginate::{walk_listing, Listing, WalkStop};
pub use crate::pipeline::{Pipeline, RunOutcome, RunSummary};
pub use crate::reaction::{parse_reaction, ReactionRecord};
pub use crate::reactions::{extract_reactions, extract_reactions_with_report};
pub use crate::store::{load_document, MergeOutcome, ReactionStore, StoreError};
