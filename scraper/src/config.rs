use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ARCHIVE_URL: &str = "https://kmt.vander-lingen.nl/archive";
pub const DEFAULT_OUTPUT_FILE: &str = "scraped_data.json";
pub const DEFAULT_MAX_REACTIONS: usize = 100;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Delays inserted between network calls. The defaults are the polite cadence
/// the archive expects; only tests should shorten them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pacing {
    pub page: Duration,
    pub reaction: Duration,
    pub dataset: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Pacing {
            page: Duration::from_millis(500),
            reaction: Duration::from_millis(100),
            dataset: Duration::from_millis(500),
        }
    }
}

impl Pacing {
    pub fn none() -> Self {
        Pacing {
            page: Duration::ZERO,
            reaction: Duration::ZERO,
            dataset: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    /// Total attempts per request, including the first one.
    pub max_attempts: u32,
    /// Backoff unit; attempt `n` waits `n * retry_delay` before retrying.
    pub retry_delay: Duration,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            retry_delay: Duration::from_secs(2),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub archive_url: String,
    pub output: PathBuf,
    /// `None` scrapes every dataset on the archive page.
    pub max_datasets: Option<usize>,
    pub max_reactions: usize,
    /// Look up reaction names on the per-reaction details pages.
    pub fetch_names: bool,
    /// Keep the existing document instead of starting from `{}`.
    pub resume: bool,
    pub pacing: Pacing,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        ScrapeConfig {
            archive_url: DEFAULT_ARCHIVE_URL.to_string(),
            output: PathBuf::from(DEFAULT_OUTPUT_FILE),
            max_datasets: None,
            max_reactions: DEFAULT_MAX_REACTIONS,
            fetch_names: true,
            resume: false,
            pacing: Pacing::default(),
        }
    }
}
