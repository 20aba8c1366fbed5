use std::error::Error as StdError;
use std::thread;

use log::{debug, warn};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::StatusCode;
use thiserror::Error;

use crate::config::FetchConfig;

/// Words that mark an otherwise unclassified error as a dropped connection.
const CONNECTION_WORDS: [&str; 4] = ["connection", "disconnected", "aborted", "remote"];

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("gave up on {url} after {attempts} attempt(s): {source}")]
    Transient {
        url: String,
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Source of page markup. `Ok(None)` means the page does not exist.
pub trait Fetch {
    fn fetch(&self, url: &str) -> Result<Option<String>, FetchError>;
}

impl<T: Fetch + ?Sized> Fetch for &T {
    fn fetch(&self, url: &str) -> Result<Option<String>, FetchError> {
        (**self).fetch(url)
    }
}

/// Blocking HTTP client that retries transient failures with linear backoff.
pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
}

enum Attempt {
    Retry(reqwest::Error),
    Fail(FetchError),
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(FetchError::Client)?;

        Ok(HttpFetcher { client, config })
    }

    fn fetch_once(&self, url: &str) -> Result<Option<String>, Attempt> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!("{} not found, treating as empty", url);
            return Ok(None);
        }
        if status.is_client_error() || status.is_server_error() {
            return Err(Attempt::Fail(FetchError::Status {
                url: url.to_string(),
                status,
            }));
        }

        response.text().map(Some).map_err(|e| classify(url, e))
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Option<String>, FetchError> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.fetch_once(url) {
                Ok(body) => return Ok(body),
                Err(Attempt::Fail(e)) => return Err(e),
                Err(Attempt::Retry(source)) => {
                    if attempt >= max_attempts {
                        return Err(FetchError::Transient {
                            url: url.to_string(),
                            attempts: attempt,
                            source,
                        });
                    }
                    let wait = self.config.retry_delay * attempt;
                    warn!(
                        "Fetching {} failed ({}), retrying in {:.1}s [{}/{}]",
                        url,
                        source,
                        wait.as_secs_f64(),
                        attempt,
                        max_attempts
                    );
                    thread::sleep(wait);
                    attempt += 1;
                }
            }
        }
    }
}

fn classify(url: &str, err: reqwest::Error) -> Attempt {
    if is_transient(&err) {
        Attempt::Retry(err)
    } else {
        Attempt::Fail(FetchError::Request {
            url: url.to_string(),
            source: err,
        })
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    if err.is_timeout() || err.is_connect() || err.is_body() {
        return true;
    }

    let mut current: Option<&dyn StdError> = Some(err);
    while let Some(e) = current {
        let msg = e.to_string().to_lowercase();
        if CONNECTION_WORDS.iter().any(|w| msg.contains(w)) {
            return true;
        }
        current = e.source();
    }
    false
}
