//! In-memory page source
//!
//! Serves fixed HTML keyed by absolute URL. Used for fixtures and for
//! replaying saved pages; every fetch is logged so callers can assert on
//! what was (and wasn't) visited.

use super::{BrowserError, BrowserResult, FetchedPage, PageSource};
use std::collections::HashMap;
use std::sync::Mutex;
use url::Url;

/// URL → HTML map implementing [`PageSource`]
#[derive(Debug, Default)]
pub struct MemorySource {
    pages: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`MemorySource::insert`]
    pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.insert(url, html);
        self
    }

    /// Registers `html` under `url` (normalized the way [`Url`] prints it)
    pub fn insert(&mut self, url: &str, html: impl Into<String>) {
        let key = Url::parse(url)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| url.to_string());
        self.pages.insert(key, html.into());
    }

    /// Every URL fetched so far, in order
    pub fn requests(&self) -> Vec<String> {
        match self.requests.lock() {
            Ok(log) => log.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// How many times `url` was fetched
    pub fn fetch_count(&self, url: &str) -> usize {
        let key = Url::parse(url)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| url.to_string());
        self.requests().iter().filter(|r| **r == key).count()
    }
}

impl PageSource for MemorySource {
    async fn fetch(&self, url: &Url) -> BrowserResult<FetchedPage> {
        let key = url.to_string();
        match self.requests.lock() {
            Ok(mut log) => log.push(key.clone()),
            Err(poisoned) => poisoned.into_inner().push(key.clone()),
        }

        match self.pages.get(&key) {
            Some(body) => Ok(FetchedPage {
                url: url.clone(),
                body: body.clone(),
            }),
            None => Err(BrowserError::Http {
                url: key,
                status: 404,
            }),
        }
    }
}
