//! Browsing capability used by the crawl engine
//!
//! The crawler never talks to a concrete browser. Everything it needs
//! (navigation, element lookup, bounded waits, clicks, text and attribute
//! reads, tab management and diagnostic snapshots) goes through the
//! [`BrowsingContext`] trait. Tabs opened on behalf of the crawler are
//! tracked on a [`SessionStack`].
//!
//! One engine ships with the crate: [`StaticBrowser`], which loads documents
//! through a [`PageSource`] and queries them with `scraper`.

mod fetcher;
mod memory;
mod session;
mod static_page;

pub use fetcher::{build_http_client, HttpSource};
pub use memory::MemorySource;
pub use session::{SessionStack, MAX_SESSION_DEPTH};
pub use static_page::{FetchedPage, PageSource, StaticBrowser};

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a browsing engine
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Timed out after {timeout_ms}ms waiting for '{selector}'")]
    Timeout { selector: String, timeout_ms: u64 },

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Stale element handle: {0}")]
    StaleElement(String),

    #[error("Element can't be clicked: {0}")]
    NotClickable(String),

    #[error("Unknown tab {0}")]
    UnknownTab(TabHandle),

    #[error("Tab {0} can't be closed or replaced")]
    ProtectedTab(TabHandle),

    #[error("No active tab")]
    NoActiveTab,

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Http { url: String, status: u16 },

    #[error("Session depth limit of {0} tabs reached")]
    DepthExceeded(usize),

    #[error("Browser has been shut down")]
    Closed,
}

impl BrowserError {
    /// Returns true if the engine itself is gone
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Returns true if this is an expired bounded wait
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Result type for browsing operations
pub type BrowserResult<T> = Result<T, BrowserError>;

/// Opaque handle to one open tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TabHandle(u64);

impl TabHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TabHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One hop from a parent element to a matching descendant
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathStep {
    pub selector: String,
    pub index: usize,
}

/// Handle to one element of a loaded document
///
/// A handle is only valid for the document it was found in. Navigating the
/// tab (including a click that follows a link) makes it stale.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    tab: TabHandle,
    generation: u64,
    path: Vec<PathStep>,
}

impl ElementHandle {
    pub fn new(tab: TabHandle, generation: u64, path: Vec<PathStep>) -> Self {
        Self {
            tab,
            generation,
            path,
        }
    }

    pub fn tab(&self) -> TabHandle {
        self.tab
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn path(&self) -> &[PathStep] {
        &self.path
    }

    /// Handle for the `index`-th descendant of this element matching `selector`
    pub fn child(&self, selector: &str, index: usize) -> Self {
        let mut path = self.path.clone();
        path.push(PathStep {
            selector: selector.to_string(),
            index,
        });
        Self {
            tab: self.tab,
            generation: self.generation,
            path,
        }
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tab)?;
        for step in &self.path {
            write!(f, " > {}[{}]", step.selector, step.index)?;
        }
        Ok(())
    }
}

/// Capability interface over an automated browser
///
/// Reads take `&self`; anything that changes which document is loaded or
/// which tab is active takes `&mut self`. Every wait is bounded by the
/// caller-provided timeout.
#[allow(async_fn_in_trait)]
pub trait BrowsingContext {
    /// Loads `url` into the active tab, creating the main tab on first use
    async fn navigate(&mut self, url: &str) -> BrowserResult<()>;

    /// Every element of the active document matching `selector`, in document order
    async fn find_all(&self, selector: &str) -> BrowserResult<Vec<ElementHandle>>;

    /// Every descendant of `parent` matching `selector`, in document order
    async fn find_all_within(
        &self,
        parent: &ElementHandle,
        selector: &str,
    ) -> BrowserResult<Vec<ElementHandle>>;

    /// Waits up to `timeout` for `selector` to match in the active document
    async fn wait_for(&self, selector: &str, timeout: Duration) -> BrowserResult<ElementHandle>;

    async fn click(&mut self, element: &ElementHandle) -> BrowserResult<()>;

    /// Rendered text of the element, whitespace collapsed
    async fn text(&self, element: &ElementHandle) -> BrowserResult<String>;

    async fn attribute(&self, element: &ElementHandle, name: &str)
        -> BrowserResult<Option<String>>;

    /// Opens `url` in a new tab without switching to it
    async fn open_tab(&mut self, url: &str) -> BrowserResult<TabHandle>;

    async fn switch_to(&mut self, tab: TabHandle) -> BrowserResult<()>;

    async fn close_tab(&mut self, tab: TabHandle) -> BrowserResult<()>;

    fn active_tab(&self) -> Option<TabHandle>;

    /// Opaque diagnostic capture of the active tab
    async fn snapshot(&self) -> BrowserResult<Vec<u8>>;

    /// Tears the engine down; later calls fail with [`BrowserError::Closed`]
    async fn quit(&mut self) -> BrowserResult<()>;

    async fn find_one(&self, selector: &str) -> BrowserResult<Option<ElementHandle>> {
        Ok(self.find_all(selector).await?.into_iter().next())
    }

    async fn find_within(
        &self,
        parent: &ElementHandle,
        selector: &str,
    ) -> BrowserResult<Option<ElementHandle>> {
        Ok(self
            .find_all_within(parent, selector)
            .await?
            .into_iter()
            .next())
    }

    /// First element matching `selector` whose text contains `needle`
    async fn find_containing(
        &self,
        selector: &str,
        needle: &str,
    ) -> BrowserResult<Option<ElementHandle>> {
        for element in self.find_all(selector).await? {
            if self.text(&element).await?.contains(needle) {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }
}
