//! Browser wrapper that records tab lifecycle calls

use review_harvest::browser::{BrowserResult, BrowsingContext, ElementHandle, TabHandle};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabEvent {
    Opened(TabHandle),
    Closed(TabHandle),
    Switched(TabHandle),
    Quit,
}

/// Delegates to `inner`, logging every open, close, switch and quit
pub struct RecordingBrowser<B> {
    inner: B,
    events: Vec<TabEvent>,
}

impl<B> RecordingBrowser<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            events: Vec::new(),
        }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    pub fn events(&self) -> &[TabEvent] {
        &self.events
    }

    pub fn opened(&self) -> usize {
        self.count(|e| matches!(e, TabEvent::Opened(_)))
    }

    pub fn closed(&self) -> usize {
        self.count(|e| matches!(e, TabEvent::Closed(_)))
    }

    pub fn quits(&self) -> usize {
        self.count(|e| matches!(e, TabEvent::Quit))
    }

    /// Highest number of tabs open at once, main window included
    pub fn peak_depth(&self) -> usize {
        let mut open = 1usize;
        let mut peak = 1usize;
        for event in &self.events {
            match event {
                TabEvent::Opened(_) => {
                    open += 1;
                    peak = peak.max(open);
                }
                TabEvent::Closed(_) => open -= 1,
                _ => {}
            }
        }
        peak
    }

    fn count(&self, f: impl Fn(&TabEvent) -> bool) -> usize {
        self.events.iter().filter(|e| f(e)).count()
    }
}

impl<B: BrowsingContext> BrowsingContext for RecordingBrowser<B> {
    async fn navigate(&mut self, url: &str) -> BrowserResult<()> {
        self.inner.navigate(url).await
    }

    async fn find_all(&self, selector: &str) -> BrowserResult<Vec<ElementHandle>> {
        self.inner.find_all(selector).await
    }

    async fn find_all_within(
        &self,
        parent: &ElementHandle,
        selector: &str,
    ) -> BrowserResult<Vec<ElementHandle>> {
        self.inner.find_all_within(parent, selector).await
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> BrowserResult<ElementHandle> {
        self.inner.wait_for(selector, timeout).await
    }

    async fn click(&mut self, element: &ElementHandle) -> BrowserResult<()> {
        self.inner.click(element).await
    }

    async fn text(&self, element: &ElementHandle) -> BrowserResult<String> {
        self.inner.text(element).await
    }

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> BrowserResult<Option<String>> {
        self.inner.attribute(element, name).await
    }

    async fn open_tab(&mut self, url: &str) -> BrowserResult<TabHandle> {
        let tab = self.inner.open_tab(url).await?;
        self.events.push(TabEvent::Opened(tab));
        Ok(tab)
    }

    async fn switch_to(&mut self, tab: TabHandle) -> BrowserResult<()> {
        self.inner.switch_to(tab).await?;
        self.events.push(TabEvent::Switched(tab));
        Ok(())
    }

    async fn close_tab(&mut self, tab: TabHandle) -> BrowserResult<()> {
        self.inner.close_tab(tab).await?;
        self.events.push(TabEvent::Closed(tab));
        Ok(())
    }

    fn active_tab(&self) -> Option<TabHandle> {
        self.inner.active_tab()
    }

    async fn snapshot(&self) -> BrowserResult<Vec<u8>> {
        self.inner.snapshot().await
    }

    async fn quit(&mut self) -> BrowserResult<()> {
        self.events.push(TabEvent::Quit);
        self.inner.quit().await
    }
}
