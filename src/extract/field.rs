//! Fault-isolated field extraction
//!
//! A field lookup is one bounded attempt: locate, read, transform. Any
//! failure along the way (element missing, wait expired, transform rejected
//! the text) yields `None` and is only visible in [`ExtractionStats`].

use crate::browser::{BrowserError, BrowserResult, BrowsingContext, ElementHandle};
use std::collections::BTreeMap;
use std::time::Duration;

/// Where a lookup starts from
#[derive(Debug, Clone, Copy)]
pub enum Scope<'a> {
    /// The active document; waits up to the field timeout
    Page,

    /// Descendants of one element
    Within(&'a ElementHandle),
}

/// What to read from a located element
#[derive(Debug, Clone, Copy)]
pub enum Read<'a> {
    Text,
    Attribute(&'a str),
}

/// Hits and misses for one field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldTally {
    pub hits: u64,
    pub misses: u64,
}

impl FieldTally {
    pub fn attempts(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of attempts that produced a value
    pub fn hit_rate(&self) -> f64 {
        if self.attempts() == 0 {
            return 0.0;
        }
        self.hits as f64 / self.attempts() as f64
    }
}

/// Per-field extraction outcomes across a crawl
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionStats {
    fields: BTreeMap<String, FieldTally>,
}

impl ExtractionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, field: &str, hit: bool) {
        let tally = self.fields.entry(field.to_string()).or_default();
        if hit {
            tally.hits += 1;
        } else {
            tally.misses += 1;
        }
    }

    pub fn tally(&self, field: &str) -> FieldTally {
        self.fields.get(field).copied().unwrap_or_default()
    }

    /// Fields in name order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldTally)> {
        self.fields.iter().map(|(name, tally)| (name.as_str(), tally))
    }

    pub fn total(&self) -> FieldTally {
        self.fields.values().fold(FieldTally::default(), |acc, t| FieldTally {
            hits: acc.hits + t.hits,
            misses: acc.misses + t.misses,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Runs field lookups against one browsing context
pub struct FieldExtractor<'a, B> {
    browser: &'a B,
    timeout: Duration,
    stats: &'a mut ExtractionStats,
}

impl<'a, B: BrowsingContext> FieldExtractor<'a, B> {
    pub fn new(browser: &'a B, timeout: Duration, stats: &'a mut ExtractionStats) -> Self {
        Self {
            browser,
            timeout,
            stats,
        }
    }

    /// One bounded lookup, read and transform; `None` on any failure
    ///
    /// Blank values count as misses, so a stored empty cell and an absent
    /// field read back the same.
    pub async fn extract<T>(
        &mut self,
        field: &str,
        scope: Scope<'_>,
        selector: &str,
        read: Read<'_>,
        transform: impl FnOnce(&str) -> Option<T>,
    ) -> Option<T> {
        let value = match self.read(scope, selector, read).await {
            Ok(raw) => raw
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .and_then(transform),
            Err(e) => {
                tracing::debug!(field, error = %e, "Field lookup failed");
                None
            }
        };

        self.stats.record(field, value.is_some());
        value
    }

    /// Like [`FieldExtractor::extract`], substituting `default` on failure
    pub async fn extract_or<T>(
        &mut self,
        field: &str,
        scope: Scope<'_>,
        selector: &str,
        read: Read<'_>,
        transform: impl FnOnce(&str) -> Option<T>,
        default: T,
    ) -> T {
        self.extract(field, scope, selector, read, transform)
            .await
            .unwrap_or(default)
    }

    /// Rendered text of the first match
    pub async fn text(&mut self, field: &str, scope: Scope<'_>, selector: &str) -> Option<String> {
        self.extract(field, scope, selector, Read::Text, |s| Some(s.to_string()))
            .await
    }

    /// Whether anything matches; a failed lookup reads as absent
    pub async fn exists(&mut self, field: &str, scope: Scope<'_>, selector: &str) -> bool {
        self.count(field, scope, selector).await > 0
    }

    /// Number of matches; a failed lookup reads as zero
    pub async fn count(&mut self, field: &str, scope: Scope<'_>, selector: &str) -> u32 {
        match self.find_all(scope, selector).await {
            Ok(found) => {
                self.stats.record(field, true);
                found.len() as u32
            }
            Err(e) => {
                tracing::debug!(field, error = %e, "Field lookup failed");
                self.stats.record(field, false);
                0
            }
        }
    }

    /// Whether the text of any match satisfies `predicate`
    pub async fn any_text(
        &mut self,
        field: &str,
        scope: Scope<'_>,
        selector: &str,
        predicate: impl Fn(&str) -> bool,
    ) -> bool {
        let outcome: BrowserResult<bool> = async {
            for element in self.find_all(scope, selector).await? {
                if predicate(&self.browser.text(&element).await?) {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        .await;

        match outcome {
            Ok(matched) => {
                self.stats.record(field, true);
                matched
            }
            Err(e) => {
                tracing::debug!(field, error = %e, "Field lookup failed");
                self.stats.record(field, false);
                false
            }
        }
    }

    async fn read(
        &self,
        scope: Scope<'_>,
        selector: &str,
        read: Read<'_>,
    ) -> BrowserResult<Option<String>> {
        let element = self.locate(scope, selector).await?;
        match read {
            Read::Text => Ok(Some(self.browser.text(&element).await?)),
            Read::Attribute(name) => self.browser.attribute(&element, name).await,
        }
    }

    async fn locate(&self, scope: Scope<'_>, selector: &str) -> BrowserResult<ElementHandle> {
        match scope {
            Scope::Page => self.browser.wait_for(selector, self.timeout).await,
            Scope::Within(parent) => {
                match tokio::time::timeout(self.timeout, self.browser.find_within(parent, selector))
                    .await
                {
                    Ok(Ok(Some(element))) => Ok(element),
                    Ok(Ok(None)) | Err(_) => Err(self.expired(selector)),
                    Ok(Err(e)) => Err(e),
                }
            }
        }
    }

    async fn find_all(&self, scope: Scope<'_>, selector: &str) -> BrowserResult<Vec<ElementHandle>> {
        let lookup = async {
            match scope {
                Scope::Page => self.browser.find_all(selector).await,
                Scope::Within(parent) => self.browser.find_all_within(parent, selector).await,
            }
        };

        tokio::time::timeout(self.timeout, lookup)
            .await
            .map_err(|_| self.expired(selector))?
    }

    fn expired(&self, selector: &str) -> BrowserError {
        BrowserError::Timeout {
            selector: selector.to_string(),
            timeout_ms: self.timeout.as_millis() as u64,
        }
    }
}
