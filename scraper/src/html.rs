use reqwest::Url;
use scraper::ElementRef;

/// Text content with every text node trimmed and joined by single spaces.
pub fn flatten_text(element: &ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decodes the entities that survive into `data-*` attributes of listing pages.
pub fn decode_entities(s: &str) -> String {
    s.replace("&gt;", ">").replace("&lt;", "<").replace("&amp;", "&")
}

/// Resolves `href` against `base` the way a browser would. Falls back to the
/// raw href when the base itself is not a valid absolute URL.
pub fn resolve_url(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    match Url::parse(base) {
        Ok(base) => base.join(href).ok().map(String::from),
        Err(_) => Some(href.to_string()),
    }
}
