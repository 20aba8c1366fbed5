use std::fs;
use std::path::Path;

pub const ARCHIVE_URL: &str = "https://kmt.vander-lingen.nl/archive";
pub const SITE: &str = "https://kmt.vander-lingen.nl";

/// Listing page of the selenium dataset in `archive.html`, starting at `start`.
pub fn selenium_listing(start: usize) -> String {
    format!("{}/data/reaction/doi/10.1021/jacsau.4c01276/start/{}", SITE, start)
}

pub fn profile_url(id: u32) -> String {
    format!("{}/data/reaction/profile/{}", SITE, id)
}

/// Load an HTML page captured under `src/tests/fixtures`
pub fn load_html_fixture(fixture_name: &str) -> String {
    let path = Path::new("src/tests/fixtures").join(format!("{}.html", fixture_name));
    fs::read_to_string(path)
        .unwrap_or_else(|_| panic!("Failed to load test fixture: {}", fixture_name))
}

/// Load a listing page saved by `save_scrape_failure`
pub fn load_failure_html(failure_name: &str) -> Option<String> {
    let path = Path::new("src/tests/fixtures/failures").join(format!("{}.html", failure_name));
    fs::read_to_string(path).ok()
}
