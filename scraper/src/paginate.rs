use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use crate::details::details_links_from_page;
use crate::fetch::Fetch;
use crate::html::{flatten_text, resolve_url};
use crate::reactions::{extract_from_page, ListingPage};

static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static CONTROL_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("button, a").unwrap());
static QUOTED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"['"]([^'"]+)['"]"#).unwrap());

const NEXT_LABELS: [&str; 3] = ["next", ">", "»"];

/// Why a listing walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStop {
    /// A page yielded no reactions; treated as the end of the data.
    EmptyPage,
    NoNextLink,
    /// The next link pointed at a page already fetched.
    Revisit,
    NotFound,
    FetchFailed,
}

/// Everything collected from one dataset's listing pages, in page order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub reactions: Vec<String>,
    /// Details page of `reactions[i]` at index `i`, when one was found.
    pub details_links: Vec<Option<String>>,
    /// Pages fetched successfully, including an empty final page.
    pub pages: usize,
    pub stop: WalkStop,
}

/// Follows "next" links from `start_url`, collecting reactions until a page
/// comes back empty, a fetch fails, or pagination loops.
pub fn walk_listing<F: Fetch>(fetcher: &F, start_url: &str, page_delay: Duration) -> Listing {
    let mut reactions = Vec::new();
    let mut details_links = Vec::new();
    let mut visited: Vec<String> = Vec::new();
    let mut current = start_url.to_string();

    let stop = loop {
        let html = match fetcher.fetch(&current) {
            Ok(Some(html)) => html,
            Ok(None) => break WalkStop::NotFound,
            Err(e) => {
                warn!("Stopping pagination at {}: {}", current, e);
                break WalkStop::FetchFailed;
            }
        };
        visited.push(current.clone());

        let page = ListingPage::parse(&html);
        let found = extract_from_page(&page).reactions;
        if found.is_empty() {
            debug!("No reactions on {}, end of listing", current);
            break WalkStop::EmptyPage;
        }

        info!("Page {}: {} reaction(s) from {}", visited.len(), found.len(), current);
        details_links.extend(details_links_from_page(&page, &current, &found));
        reactions.extend(found);

        let next = match find_next_page(page.document(), &current) {
            Some(next) => next,
            None => break WalkStop::NoNextLink,
        };
        if next == current || visited.contains(&next) {
            break WalkStop::Revisit;
        }

        current = next;
        thread::sleep(page_delay);
    };

    Listing {
        reactions,
        details_links,
        pages: visited.len(),
        stop,
    }
}

/// Finds the "next page" control and resolves its target against `current_url`.
pub fn find_next_page(document: &Html, current_url: &str) -> Option<String> {
    for link in document.select(&LINK_SELECTOR) {
        let label = flatten_text(&link).to_lowercase();
        if NEXT_LABELS.contains(&label.as_str()) {
            if let Some(url) = link
                .value()
                .attr("href")
                .and_then(|href| resolve_url(current_url, href))
            {
                return Some(url);
            }
        }
    }

    for control in document.select(&CONTROL_SELECTOR) {
        if flatten_text(&control).to_lowercase() != "next" {
            continue;
        }
        if let Some(url) = control
            .value()
            .attr("href")
            .and_then(|href| resolve_url(current_url, href))
        {
            return Some(url);
        }
        let target = control
            .value()
            .attr("onclick")
            .and_then(|onclick| QUOTED_RE.captures(onclick))
            .and_then(|caps| resolve_url(current_url, &caps[1]));
        if target.is_some() {
            return target;
        }
    }

    None
}
