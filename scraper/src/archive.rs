use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::html::{flatten_text, resolve_url};

const REACTION_DATA: &str = "reaction data";

/// Boilerplate phrases the archive page header leaks into entry text.
const HEADER_PHRASES: [&str; 3] = [
    "you have reached the archives",
    "chemical reaction database",
    "archives of the",
];

static BLOCK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("li, div, p").unwrap());
static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

// "Compound Name, Authors Year reaction data"
static ENTRY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^([^,]+),\s*([^0-9]+?)\s*(\d{4})\s*reaction data").unwrap());
static DOI_IN_HREF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)doi(?:\.org)?[=/](\d+\.[^/\s&?#]+(?:/[^/\s&?#]+)?)").unwrap()
});
static LEADING_YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}\s*").unwrap());

/// One text cleanup rule: when `trigger` occurs (case-insensitively), every
/// match of `pattern` is replaced with `replacement`.
struct SanitizeRule {
    trigger: &'static str,
    pattern: Regex,
    replacement: &'static str,
}

static HEADER_RULES: Lazy<Vec<SanitizeRule>> = Lazy::new(|| {
    HEADER_PHRASES
        .iter()
        .map(|phrase| SanitizeRule {
            trigger: *phrase,
            pattern: Regex::new(&format!(r"(?i).*?{}\W*", regex::escape(phrase))).unwrap(),
            replacement: "",
        })
        .collect()
});

/// A dataset listed on the archive page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetEntry {
    pub name: String,
    pub authors: String,
    pub year: String,
    /// Absolute URL of the first reaction listing page.
    pub listing_url: String,
    /// DOI taken from the entry's DOI link; never an absolute URL.
    pub doi_hint: Option<String>,
    /// The DOI link itself when it was an absolute URL we could not reduce.
    pub doi_link: Option<String>,
}

impl DatasetEntry {
    /// Every URL-valued field, keyed by field name.
    pub fn url_fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields = vec![("listing_url", self.listing_url.as_str())];
        if let Some(link) = &self.doi_link {
            fields.push(("doi_link", link.as_str()));
        }
        fields
    }
}

/// Strips archive header boilerplate (and the year that trails it) from the
/// front of an entry's text.
pub fn strip_header(text: &str) -> String {
    let mut out = text.trim().to_string();
    let mut stripped = false;
    for rule in HEADER_RULES.iter() {
        if out.to_lowercase().contains(rule.trigger) {
            out = rule
                .pattern
                .replace_all(&out, rule.replacement)
                .trim()
                .to_string();
            stripped = true;
        }
    }
    if stripped {
        out = LEADING_YEAR_RE.replace(&out, "").trim().to_string();
    }
    out
}

fn mentions_reaction_data(text: &str) -> bool {
    text.to_lowercase().contains(REACTION_DATA)
}

/// Parses the archive index into dataset entries, in document order.
pub fn extract_entries(html: &str, base_url: &str) -> Vec<DatasetEntry> {
    let document = Html::parse_document(html);
    let mut entries = Vec::new();

    for element in document.select(&BLOCK_SELECTOR) {
        let text = flatten_text(&element);
        if !mentions_reaction_data(&text) || has_candidate_descendant(&element) {
            continue;
        }
        if let Some(entry) = parse_entry(&element, &text, base_url) {
            entries.push(entry);
        }
    }

    debug!("Archive page lists {} dataset(s)", entries.len());
    entries
}

/// Containers wrapping a whole list of entries also mention "reaction data";
/// only the innermost element is an entry.
fn has_candidate_descendant(element: &ElementRef) -> bool {
    element
        .select(&BLOCK_SELECTOR)
        .any(|inner| inner.id() != element.id() && mentions_reaction_data(&flatten_text(&inner)))
}

fn parse_entry(element: &ElementRef, raw_text: &str, base_url: &str) -> Option<DatasetEntry> {
    let text = strip_header(raw_text);
    if !mentions_reaction_data(&text) {
        return None;
    }

    let links = EntryLinks::scan(element, base_url);
    let listing_url = links.reaction_data?;

    let (name, authors, year) = match ENTRY_RE.captures(&text) {
        Some(caps) => (
            caps[1].trim().to_string(),
            caps[2].trim().to_string(),
            caps[3].to_string(),
        ),
        None => (fallback_name(&text), String::new(), String::new()),
    };

    let (doi_hint, doi_link) = match links.doi {
        Some(doi) if doi.starts_with("http") => (None, Some(doi)),
        Some(doi) if !doi.is_empty() => (Some(doi), None),
        _ => (None, None),
    };

    Some(DatasetEntry {
        name,
        authors,
        year,
        listing_url,
        doi_hint,
        doi_link,
    })
}

fn fallback_name(text: &str) -> String {
    let head: String = match text.split_once(',') {
        Some((head, _)) => head.trim().to_string(),
        None => text.chars().take(50).collect(),
    };
    let name = strip_header(&head);
    if name.is_empty() {
        "Unknown".to_string()
    } else {
        name
    }
}

struct EntryLinks {
    reaction_data: Option<String>,
    doi: Option<String>,
}

impl EntryLinks {
    fn scan(element: &ElementRef, base_url: &str) -> Self {
        let mut reaction_data = None;
        let mut doi_by_text = None;
        let mut doi_by_href = None;

        for link in element.select(&LINK_SELECTOR) {
            let href = link.value().attr("href").unwrap_or("");
            let href_lower = href.to_lowercase();
            let link_text = flatten_text(&link).to_lowercase();

            if reaction_data.is_none()
                && (link_text.contains(REACTION_DATA)
                    || (href_lower.contains("reaction") && href_lower.contains("data")))
            {
                reaction_data = resolve_url(base_url, href);
            }

            if link_text == "doi" && doi_by_text.is_none() {
                doi_by_text = Some(doi_from_href(href));
            } else if href_lower.contains("doi") && doi_by_href.is_none() {
                doi_by_href = Some(doi_from_href(href));
            }
        }

        if reaction_data.is_none() {
            reaction_data = element
                .select(&LINK_SELECTOR)
                .filter_map(|link| link.value().attr("href"))
                .find(|href| {
                    let lower = href.to_lowercase();
                    lower.contains("reaction") || lower.contains("data")
                })
                .and_then(|href| resolve_url(base_url, href));
        }

        EntryLinks {
            reaction_data,
            doi: doi_by_text.or(doi_by_href),
        }
    }
}

fn doi_from_href(href: &str) -> String {
    DOI_IN_HREF_RE
        .captures(href)
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| href.trim().to_string())
}
