use std::collections::BTreeMap;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::html::{flatten_text, resolve_url};
use crate::reactions::{extract_from_page, ListingPage};

const PROFILE_PATH: &str = "/data/reaction/profile/";
const MAX_NAME_LEN: usize = 100;
const REACTION_KEYWORDS: [&str; 9] = [
    "oxidation",
    "reduction",
    "coupling",
    "synthesis",
    "addition",
    "substitution",
    "elimination",
    "cyclization",
    "reaction",
];

static TITLE_LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"a[id^="title-"][href]"#).unwrap());
static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static H2_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("h2").unwrap());
static BADGE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.badge-pill.badge-info").unwrap());

static TITLE_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^title-(\d+)$").unwrap());

/// "Details" profile link for each reaction `extract_reactions` finds on the
/// page, position for position. `None` where no link belongs to a reaction.
pub fn extract_details_links(html: &str, page_url: &str) -> Vec<Option<String>> {
    let page = ListingPage::parse(html);
    let reactions = extract_from_page(&page).reactions;
    details_links_from_page(&page, page_url, &reactions)
}

/// Links for `reactions`, which must be what was extracted from `page`.
///
/// When the panes produced the reactions each link comes from the pane that
/// carried the reaction. Otherwise page-wide links are paired by position only
/// if there is exactly one per reaction.
pub fn details_links_from_page(
    page: &ListingPage,
    page_url: &str,
    reactions: &[String],
) -> Vec<Option<String>> {
    let panes = page.pane_reactions();
    if !panes.is_empty() && panes.iter().map(|(reaction, _)| reaction).eq(reactions.iter()) {
        return panes
            .iter()
            .map(|(_, pane)| pane_details_link(pane, page_url))
            .collect();
    }

    let links = page_links(page, page_url);
    if links.len() == reactions.len() {
        return links.into_iter().map(Some).collect();
    }
    if !links.is_empty() {
        debug!(
            "{} details link(s) for {} reaction(s) on {}, not pairing them",
            links.len(),
            reactions.len(),
            page_url
        );
    }
    vec![None; reactions.len()]
}

fn pane_details_link(pane: &ElementRef, page_url: &str) -> Option<String> {
    let link = pane.select(&TITLE_LINK_SELECTOR).next().or_else(|| {
        pane.select(&LINK_SELECTOR)
            .find(|a| flatten_text(a).to_lowercase().contains("details"))
    })?;
    resolve_url(page_url, link.value().attr("href")?)
}

/// Title links ordered by index, else every distinct profile link.
fn page_links(page: &ListingPage, page_url: &str) -> Vec<String> {
    let mut by_index = BTreeMap::new();
    for link in page.document().select(&TITLE_LINK_SELECTOR) {
        if !flatten_text(&link).eq_ignore_ascii_case("details") {
            continue;
        }
        let index = link
            .value()
            .attr("id")
            .and_then(|id| TITLE_ID_RE.captures(id))
            .and_then(|caps| caps[1].parse::<usize>().ok());
        let url = link.value().attr("href").and_then(|h| resolve_url(page_url, h));
        if let (Some(index), Some(url)) = (index, url) {
            by_index.entry(index).or_insert(url);
        }
    }
    if !by_index.is_empty() {
        return by_index.into_values().collect();
    }

    let mut profile_links: Vec<String> = Vec::new();
    for link in page.document().select(&LINK_SELECTOR) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if !href.contains(PROFILE_PATH) {
            continue;
        }
        if let Some(url) = resolve_url(page_url, href) {
            if !profile_links.contains(&url) {
                profile_links.push(url);
            }
        }
    }
    profile_links
}

/// Reaction name shown on a details page, e.g. "Riley oxidation".
pub fn extract_reaction_name(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let h2 = document.select(&H2_SELECTOR).next();

    let badge_in_h2 = h2.and_then(|h2| h2.select(&BADGE_SELECTOR).next());
    let badge = badge_in_h2.or_else(|| document.select(&BADGE_SELECTOR).next());
    if let Some(name) = badge.map(|b| flatten_text(&b)).filter(|n| plausible_name(n)) {
        return Some(name);
    }

    h2.map(|h2| flatten_text(&h2))
        .filter(|text| plausible_name(text))
        .filter(|text| {
            let lower = text.to_lowercase();
            REACTION_KEYWORDS.iter().any(|k| lower.contains(k))
        })
}

fn plausible_name(name: &str) -> bool {
    !name.is_empty() && name.chars().count() < MAX_NAME_LEN
}
