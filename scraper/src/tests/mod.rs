use std::cell::RefCell;
use std::collections::HashMap;

use reqwest::StatusCode;

use crate::fetch::{Fetch, FetchError};

pub mod fixtures;
pub mod store_tests;

/// In-memory site: serves registered pages, 404s everything else and
/// remembers every URL it was asked for.
#[derive(Default)]
pub struct MockSite {
    pages: HashMap<String, String>,
    failing: HashMap<String, StatusCode>,
    requests: RefCell<Vec<String>>,
}

impl MockSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    pub fn failing(mut self, url: impl Into<String>, status: StatusCode) -> Self {
        self.failing.insert(url.into(), status);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    pub fn was_requested(&self, url: &str) -> bool {
        self.requests.borrow().iter().any(|u| u == url)
    }
}

impl Fetch for MockSite {
    fn fetch(&self, url: &str) -> Result<Option<String>, FetchError> {
        self.requests.borrow_mut().push(url.to_string());
        if let Some(status) = self.failing.get(url) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: *status,
            });
        }
        Ok(self.pages.get(url).cloned())
    }
}
