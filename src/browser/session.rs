//! Stack of nested tabs opened by the crawler
//!
//! The crawl nests at most three contexts: the listing in the main window,
//! a product tab, and a reviews tab. Every tab pushed here must be popped
//! before the next listing item starts; callers record [`SessionStack::depth`]
//! before descending and call [`SessionStack::unwind_to`] on every exit path.

use super::{BrowserError, BrowserResult, BrowsingContext, TabHandle};

/// Main window plus product tab plus reviews tab
pub const MAX_SESSION_DEPTH: usize = 3;

/// Ordered stack of open tabs, main window at the bottom
#[derive(Debug, Clone)]
pub struct SessionStack {
    tabs: Vec<TabHandle>,
}

impl SessionStack {
    /// Creates a stack rooted at the main window
    pub fn new(main: TabHandle) -> Self {
        Self { tabs: vec![main] }
    }

    pub fn depth(&self) -> usize {
        self.tabs.len()
    }

    pub fn main(&self) -> TabHandle {
        self.tabs[0]
    }

    /// The tab that should currently be active
    pub fn current(&self) -> TabHandle {
        self.tabs[self.tabs.len() - 1]
    }

    /// Opens `url` in a new tab and makes it active
    ///
    /// The tab is recorded before switching, so a failed switch still gets
    /// the tab closed by the next unwind.
    pub async fn push<B: BrowsingContext>(
        &mut self,
        browser: &mut B,
        url: &str,
    ) -> BrowserResult<TabHandle> {
        if self.tabs.len() >= MAX_SESSION_DEPTH {
            return Err(BrowserError::DepthExceeded(MAX_SESSION_DEPTH));
        }

        let tab = browser.open_tab(url).await?;
        self.tabs.push(tab);
        tracing::trace!(tab = %tab, depth = self.tabs.len(), "Pushed tab");
        browser.switch_to(tab).await?;
        Ok(tab)
    }

    /// Closes the top tab and reactivates the one below it
    ///
    /// The main window is never popped.
    pub async fn pop<B: BrowsingContext>(&mut self, browser: &mut B) -> BrowserResult<()> {
        if self.tabs.len() <= 1 {
            return Ok(());
        }

        let tab = self.tabs.pop().ok_or(BrowserError::NoActiveTab)?;
        let closed = browser.close_tab(tab).await;
        let switched = browser.switch_to(self.current()).await;
        tracing::trace!(tab = %tab, depth = self.tabs.len(), "Popped tab");
        closed.and(switched)
    }

    /// Swaps the top tab for a freshly opened one at the same depth
    pub async fn replace_top<B: BrowsingContext>(
        &mut self,
        browser: &mut B,
        url: &str,
    ) -> BrowserResult<TabHandle> {
        if self.tabs.len() <= 1 {
            return Err(BrowserError::ProtectedTab(self.main()));
        }

        let tab = browser.open_tab(url).await?;
        let last = self.tabs.len() - 1;
        let old = std::mem::replace(&mut self.tabs[last], tab);

        let switched = browser.switch_to(tab).await;
        let closed = browser.close_tab(old).await;
        tracing::trace!(old = %old, new = %tab, "Replaced top tab");
        switched.and(closed)?;
        Ok(tab)
    }

    /// Pops until the stack is back to `depth` (never below the main window)
    ///
    /// Keeps popping after a failure and reports the first error.
    pub async fn unwind_to<B: BrowsingContext>(
        &mut self,
        browser: &mut B,
        depth: usize,
    ) -> BrowserResult<()> {
        let target = depth.max(1);
        let mut first_error = None;

        while self.tabs.len() > target {
            if let Err(e) = self.pop(browser).await {
                tracing::warn!("Failed to close tab while unwinding: {}", e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
