use std::fmt;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::archive::DatasetEntry;

/// Marks identifiers that were synthesised because no DOI could be found.
pub const UNRESOLVED_PREFIX: &str = "dataset_";
const FALLBACK_MODULUS: u64 = 1_000_000;

/// URL patterns tried in order; earlier patterns are more specific.
static DOI_PATTERNS: Lazy<[Regex; 4]> = Lazy::new(|| {
    [
        // /doi/10.1021/jacsau.4c01276/start/0
        Regex::new(r"/doi/([^/?#\s]+/[^/?#\s]+)").unwrap(),
        Regex::new(r"/doi/([^/?#\s]+)").unwrap(),
        // ?doi=10.1021/jacsau.4c01276
        Regex::new(r"(?i)doi=(\d+\.[^/\s&#]+(?:/[^/\s&#]+)?)").unwrap(),
        Regex::new(r"(?i)doi\.org/(\d+\.[^/\s?#]+/[^/\s?#]+)").unwrap(),
    ]
});

/// Stable key of a dataset, ideally a DOI such as `10.1021/jacsau.4c01276`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetId(String);

impl DatasetId {
    pub fn new(id: impl Into<String>) -> Self {
        DatasetId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Only resolved identifiers may be written to the store.
    pub fn is_resolved(&self) -> bool {
        !self.0.is_empty() && !self.0.starts_with(UNRESOLVED_PREFIX)
    }

    /// Splits on the first `/` into DOI prefix and suffix.
    pub fn doi_parts(&self) -> (&str, Option<&str>) {
        match self.0.split_once('/') {
            Some((prefix, suffix)) => (prefix, Some(suffix)),
            None => (self.0.as_str(), None),
        }
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn doi_from_url(url: &str) -> Option<String> {
    DOI_PATTERNS.iter().find_map(|re| {
        re.captures(url)
            .map(|caps| caps[1].trim_end_matches('/').to_string())
            .filter(|doi| !doi.is_empty())
    })
}

/// DOI carried by an archive entry: its DOI hint, else any of its URLs.
pub fn doi_from_entry(entry: &DatasetEntry) -> Option<String> {
    let hint = entry
        .doi_hint
        .as_deref()
        .map(str::trim)
        .filter(|hint| !hint.is_empty() && !hint.starts_with("http"))
        .map(str::to_string);

    let from_urls = entry
        .url_fields()
        .into_iter()
        .find_map(|(field, value)| {
            let doi = doi_from_url(value)?;
            debug!("DOI {} found in entry field {}", doi, field);
            Some(doi)
        });

    prefer_specific(hint, from_urls)
}

/// Resolves the dataset behind `url`. Entry metadata beats the URL, but a
/// bare DOI prefix never replaces a full DOI that extends it.
pub fn resolve_dataset_id(url: &str, entry: Option<&DatasetEntry>) -> DatasetId {
    let from_entry = entry.and_then(doi_from_entry);
    let from_url = doi_from_url(url);

    match prefer_specific(from_entry, from_url) {
        Some(doi) => DatasetId::new(doi),
        None => {
            let id = fallback_id(url);
            debug!("No DOI for {}, using {}", url, id);
            id
        }
    }
}

/// Deterministic placeholder for a dataset without a DOI.
pub fn fallback_id(url: &str) -> DatasetId {
    let digest = Sha256::digest(url.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    let n = u64::from_be_bytes(head) % FALLBACK_MODULUS;
    DatasetId::new(format!("{}{}", UNRESOLVED_PREFIX, n))
}

fn prefer_specific(preferred: Option<String>, other: Option<String>) -> Option<String> {
    match (preferred, other) {
        (Some(p), Some(o)) if !p.contains('/') && o.starts_with(&format!("{}/", p)) => Some(o),
        (Some(p), _) => Some(p),
        (None, o) => o,
    }
}
