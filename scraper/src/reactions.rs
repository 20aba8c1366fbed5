//! Pulls raw `reactants>solvents>products` strings out of a listing page.
//!
//! The archive has shipped several markups for the same data, so extraction
//! is a list of independent strategies. The structural one wins outright when
//! it finds anything; otherwise the fallbacks run in order and accumulate.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::html::decode_entities;

pub const SMILES_ATTR: &str = "data-reaction-smiles";

static PANE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"div[id^="reaction-pane-"]"#).unwrap());
static SMILES_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("[data-reaction-smiles]").unwrap());
static SMILES_BUTTON_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("button[data-reaction-smiles]").unwrap());
static SCRIPT_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("script").unwrap());

static PANE_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^reaction-pane-(\d+)$").unwrap());
static PUSH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)reactions\.push\(\s*['"](.*?)['"]\s*\)"#).unwrap());
static SCRIPT_LITERAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"['"]([A-Za-z0-9@+\-\[\]()=#.]+>[A-Za-z0-9@+\-\[\]()=#.]*>[A-Za-z0-9@+\-\[\]()=#.]+)['"]"#,
    )
    .unwrap()
});

/// A parsed listing page plus its raw markup, which some fallbacks scan directly.
pub struct ListingPage<'a> {
    raw: &'a str,
    document: Html,
}

impl<'a> ListingPage<'a> {
    pub fn parse(raw: &'a str) -> Self {
        ListingPage {
            raw,
            document: Html::parse_document(raw),
        }
    }

    pub fn raw(&self) -> &str {
        self.raw
    }

    pub fn document(&self) -> &Html {
        &self.document
    }

    /// `reaction-pane-<n>` containers ordered by `n`.
    pub fn reaction_panes(&self) -> Vec<(usize, ElementRef<'_>)> {
        let mut panes: Vec<(usize, ElementRef)> = self
            .document
            .select(&PANE_SELECTOR)
            .filter_map(|pane| {
                let id = pane.value().attr("id")?;
                let index = PANE_ID_RE.captures(id)?[1].parse::<usize>().ok()?;
                Some((index, pane))
            })
            .collect();
        panes.sort_by_key(|(index, _)| *index);
        panes
    }

    /// Each distinct pane reaction together with the pane it was first found
    /// in. Panes without a reaction, and repeats, are left out.
    pub fn pane_reactions(&self) -> Vec<(String, ElementRef<'_>)> {
        let mut found: Vec<(String, ElementRef)> = Vec::new();
        for (_, pane) in self.reaction_panes() {
            let control = pane
                .select(&SMILES_BUTTON_SELECTOR)
                .next()
                .or_else(|| pane.select(&SMILES_SELECTOR).next());
            let Some(smiles) = control.and_then(|c| c.value().attr(SMILES_ATTR)) else {
                continue;
            };
            let reaction = decode_entities(smiles);
            if !reaction.is_empty() && !found.iter().any(|(seen, _)| *seen == reaction) {
                found.push((reaction, pane));
            }
        }
        found
    }
}

/// A named, side-effect-free way of finding reaction strings on a page.
pub struct Strategy {
    pub name: &'static str,
    pub extract: fn(&ListingPage) -> Vec<String>,
    /// Whether results are checked against what earlier strategies found.
    pub dedup: bool,
}

pub const PRIMARY: Strategy = Strategy {
    name: "reaction panes",
    extract: from_reaction_panes,
    dedup: true,
};

pub const FALLBACKS: [Strategy; 3] = [
    Strategy {
        name: "script push calls",
        extract: from_push_calls,
        dedup: false,
    },
    Strategy {
        name: "smiles attributes",
        extract: from_smiles_attributes,
        dedup: true,
    },
    Strategy {
        name: "script literals",
        extract: from_script_literals,
        dedup: true,
    },
];

/// How many strings each strategy contributed, in the order they ran.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractionReport {
    pub reactions: Vec<String>,
    pub contributions: Vec<(&'static str, usize)>,
}

pub fn extract_reactions(html: &str) -> Vec<String> {
    extract_reactions_with_report(html).reactions
}

pub fn extract_reactions_with_report(html: &str) -> ExtractionReport {
    let page = ListingPage::parse(html);
    extract_from_page(&page)
}

pub fn extract_from_page(page: &ListingPage) -> ExtractionReport {
    let mut report = ExtractionReport::default();

    apply(&PRIMARY, page, &mut report);
    if !report.reactions.is_empty() {
        return report;
    }

    for strategy in FALLBACKS.iter() {
        apply(strategy, page, &mut report);
    }
    report
}

fn apply(strategy: &Strategy, page: &ListingPage, report: &mut ExtractionReport) {
    let mut added = 0;
    for reaction in (strategy.extract)(page) {
        if strategy.dedup && report.reactions.contains(&reaction) {
            continue;
        }
        report.reactions.push(reaction);
        added += 1;
    }
    debug!("Strategy '{}' found {} reaction(s)", strategy.name, added);
    report.contributions.push((strategy.name, added));
}

fn push_unique(found: &mut Vec<String>, reaction: String) {
    if !reaction.is_empty() && !found.contains(&reaction) {
        found.push(reaction);
    }
}

fn from_reaction_panes(page: &ListingPage) -> Vec<String> {
    page.pane_reactions()
        .into_iter()
        .map(|(reaction, _)| reaction)
        .collect()
}

fn from_push_calls(page: &ListingPage) -> Vec<String> {
    PUSH_RE
        .captures_iter(page.raw())
        .map(|caps| caps[1].to_string())
        .filter(|reaction| !reaction.is_empty())
        .collect()
}

fn from_smiles_attributes(page: &ListingPage) -> Vec<String> {
    let mut found = Vec::new();
    for element in page.document().select(&SMILES_SELECTOR) {
        if let Some(smiles) = element.value().attr(SMILES_ATTR) {
            push_unique(&mut found, decode_entities(smiles));
        }
    }
    found
}

fn from_script_literals(page: &ListingPage) -> Vec<String> {
    let mut found = Vec::new();
    for script in page.document().select(&SCRIPT_SELECTOR) {
        let body: String = script.text().collect();
        for caps in SCRIPT_LITERAL_RE.captures_iter(&body) {
            let reaction = caps[1].to_string();
            if reaction.contains('>') {
                push_unique(&mut found, reaction);
            }
        }
    }
    found
}
