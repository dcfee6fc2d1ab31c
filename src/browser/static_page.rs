//! Browsing engine over fully rendered documents
//!
//! Each tab parses its document once, when it loads, and keeps the tree
//! until the tab navigates or closes. Element handles resolve against that
//! tree as paths of `(selector, index)` hops from the document root.

use super::{BrowserError, BrowserResult, BrowsingContext, ElementHandle, PathStep, TabHandle};
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// A loaded document
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects
    pub url: Url,

    /// HTML body
    pub body: String,
}

/// Where a [`StaticBrowser`] loads its documents from
#[allow(async_fn_in_trait)]
pub trait PageSource {
    async fn fetch(&self, url: &Url) -> BrowserResult<FetchedPage>;
}

#[derive(Debug)]
struct Tab {
    url: Url,
    body: String,
    document: Html,
    generation: u64,
}

impl Tab {
    fn new(page: FetchedPage, generation: u64) -> Self {
        Self {
            document: Html::parse_document(&page.body),
            url: page.url,
            body: page.body,
            generation,
        }
    }
}

/// Elements that start a new line when rendered
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li",
    "main", "nav", "ol", "p", "pre", "section", "table", "tr", "ul",
];

/// Browsing engine that loads documents from a [`PageSource`]
///
/// A loaded document is fully rendered, so waits resolve on the first
/// check. Clicks follow the element's link in the active tab.
pub struct StaticBrowser<S> {
    source: S,
    tabs: BTreeMap<TabHandle, Tab>,
    main: Option<TabHandle>,
    active: Option<TabHandle>,
    next_tab: u64,
    next_generation: u64,
    load_timeout: Duration,
    closed: bool,
}

impl<S: PageSource> StaticBrowser<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            tabs: BTreeMap::new(),
            main: None,
            active: None,
            next_tab: 1,
            next_generation: 1,
            load_timeout: Duration::from_secs(60),
            closed: false,
        }
    }

    /// Upper bound for one document load
    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Number of open tabs, main window included
    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    /// URL of the active tab's document
    pub fn current_url(&self) -> Option<&Url> {
        self.active
            .and_then(|handle| self.tabs.get(&handle))
            .map(|tab| &tab.url)
    }

    fn ensure_open(&self) -> BrowserResult<()> {
        if self.closed {
            return Err(BrowserError::Closed);
        }
        Ok(())
    }

    fn tab(&self, handle: TabHandle) -> BrowserResult<&Tab> {
        self.ensure_open()?;
        self.tabs
            .get(&handle)
            .ok_or(BrowserError::UnknownTab(handle))
    }

    fn active(&self) -> BrowserResult<(TabHandle, &Tab)> {
        self.ensure_open()?;
        let handle = self.active.ok_or(BrowserError::NoActiveTab)?;
        Ok((handle, self.tab(handle)?))
    }

    fn bump_generation(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        generation
    }

    /// Resolves `url` against the active document and loads it
    async fn load(&self, url: &str) -> BrowserResult<FetchedPage> {
        let base = self.active().ok().map(|(_, tab)| tab.url.clone());
        let target = resolve_url(base.as_ref(), url)?;

        match tokio::time::timeout(self.load_timeout, self.source.fetch(&target)).await {
            Ok(result) => result,
            Err(_) => Err(BrowserError::Navigation {
                url: target.to_string(),
                message: format!("load timed out after {:?}", self.load_timeout),
            }),
        }
    }

    /// Runs `f` against the element behind `handle`
    fn with_element<T>(
        &self,
        handle: &ElementHandle,
        f: impl FnOnce(ElementRef<'_>, &Url) -> T,
    ) -> BrowserResult<T> {
        let tab = self.tab(handle.tab())?;
        if tab.generation != handle.generation() {
            return Err(BrowserError::StaleElement(handle.to_string()));
        }

        let element = locate(&tab.document, handle.path())?
            .ok_or_else(|| BrowserError::StaleElement(handle.to_string()))?;
        Ok(f(element, &tab.url))
    }

    /// Every match for `selector` below the element at `parent`
    fn select_all(&self, parent: &ElementHandle, selector: &str) -> BrowserResult<Vec<ElementHandle>> {
        let compiled = parse_selector(selector)?;
        self.with_element(parent, |element, _| {
            (0..element.select(&compiled).count())
                .map(|index| parent.child(selector, index))
                .collect()
        })
    }

    fn document_root(&self) -> BrowserResult<ElementHandle> {
        let (handle, tab) = self.active()?;
        Ok(ElementHandle::new(handle, tab.generation, Vec::new()))
    }
}

impl<S: PageSource> BrowsingContext for StaticBrowser<S> {
    async fn navigate(&mut self, url: &str) -> BrowserResult<()> {
        self.ensure_open()?;
        let page = self.load(url).await?;
        let generation = self.bump_generation();

        match self.active {
            Some(handle) => {
                let tab = self
                    .tabs
                    .get_mut(&handle)
                    .ok_or(BrowserError::UnknownTab(handle))?;
                *tab = Tab::new(page, generation);
            }
            None if self.main.is_none() => {
                let handle = TabHandle::new(self.next_tab);
                self.next_tab += 1;
                self.tabs.insert(handle, Tab::new(page, generation));
                self.main = Some(handle);
                self.active = Some(handle);
            }
            None => return Err(BrowserError::NoActiveTab),
        }

        tracing::trace!(url = %url, "Navigated");
        Ok(())
    }

    async fn find_all(&self, selector: &str) -> BrowserResult<Vec<ElementHandle>> {
        let root = self.document_root()?;
        self.select_all(&root, selector)
    }

    async fn find_all_within(
        &self,
        parent: &ElementHandle,
        selector: &str,
    ) -> BrowserResult<Vec<ElementHandle>> {
        self.select_all(parent, selector)
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> BrowserResult<ElementHandle> {
        let expired = || BrowserError::Timeout {
            selector: selector.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        };

        match tokio::time::timeout(timeout, self.find_one(selector)).await {
            Ok(Ok(Some(element))) => Ok(element),
            Ok(Ok(None)) | Err(_) => Err(expired()),
            Ok(Err(e)) => Err(e),
        }
    }

    async fn click(&mut self, element: &ElementHandle) -> BrowserResult<()> {
        let (active, _) = self.active()?;
        if element.tab() != active {
            return Err(BrowserError::StaleElement(element.to_string()));
        }

        let href = self
            .with_element(element, |el, _| link_target(el))?
            .ok_or_else(|| BrowserError::NotClickable(element.to_string()))?;

        self.navigate(&href).await
    }

    async fn text(&self, element: &ElementHandle) -> BrowserResult<String> {
        self.with_element(element, rendered_text)
    }

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> BrowserResult<Option<String>> {
        self.with_element(element, |el, base| {
            let value = el.value().attr(name)?;
            // Link attributes read back absolute, the way a live DOM reports them
            if name == "href" || name == "src" {
                Some(
                    base.join(value)
                        .map(|u| u.to_string())
                        .unwrap_or_else(|_| value.to_string()),
                )
            } else {
                Some(value.to_string())
            }
        })
    }

    async fn open_tab(&mut self, url: &str) -> BrowserResult<TabHandle> {
        self.ensure_open()?;
        let page = self.load(url).await?;
        let generation = self.bump_generation();

        let handle = TabHandle::new(self.next_tab);
        self.next_tab += 1;
        self.tabs.insert(handle, Tab::new(page, generation));
        if self.main.is_none() {
            self.main = Some(handle);
        }

        tracing::trace!(tab = %handle, url = %url, "Opened tab");
        Ok(handle)
    }

    async fn switch_to(&mut self, tab: TabHandle) -> BrowserResult<()> {
        self.tab(tab)?;
        self.active = Some(tab);
        Ok(())
    }

    async fn close_tab(&mut self, tab: TabHandle) -> BrowserResult<()> {
        self.tab(tab)?;
        if self.main == Some(tab) {
            return Err(BrowserError::ProtectedTab(tab));
        }

        self.tabs.remove(&tab);
        if self.active == Some(tab) {
            self.active = None;
        }
        Ok(())
    }

    fn active_tab(&self) -> Option<TabHandle> {
        if self.closed {
            return None;
        }
        self.active
    }

    async fn snapshot(&self) -> BrowserResult<Vec<u8>> {
        let (_, tab) = self.active()?;
        Ok(tab.body.as_bytes().to_vec())
    }

    async fn quit(&mut self) -> BrowserResult<()> {
        if !self.closed {
            tracing::debug!(tabs = self.tabs.len(), "Shutting down browser");
        }
        self.closed = true;
        self.tabs.clear();
        self.active = None;
        Ok(())
    }
}

fn parse_selector(selector: &str) -> BrowserResult<Selector> {
    Selector::parse(selector).map_err(|_| BrowserError::InvalidSelector(selector.to_string()))
}

/// Walks `path` from the document root
fn locate<'a>(document: &'a Html, path: &[PathStep]) -> BrowserResult<Option<ElementRef<'a>>> {
    let mut current = document.root_element();
    for step in path {
        let selector = parse_selector(&step.selector)?;
        match current.select(&selector).nth(step.index) {
            Some(element) => current = element,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

/// Text as a browser renders it
///
/// Whitespace runs collapse to one space. Line breaks come from `<br>` and
/// block elements, and blank lines are dropped.
fn rendered_text(element: ElementRef<'_>, _: &Url) -> String {
    let mut raw = String::new();
    push_text(element, &mut raw);

    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn push_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                out.extend(text.chars().map(|c| if c.is_whitespace() { ' ' } else { c }))
            }
            Node::Element(el) if el.name() == "br" => out.push('\n'),
            Node::Element(el) => {
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                let block = BLOCK_ELEMENTS.contains(&el.name());
                if block {
                    out.push('\n');
                }
                push_text(child, out);
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// The link a click on `element` would follow
fn link_target(element: ElementRef<'_>) -> Option<String> {
    if let Some(href) = element.value().attr("href") {
        return Some(href.to_string());
    }

    let anchor = Selector::parse("a[href]").ok()?;
    element
        .select(&anchor)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string)
}

fn resolve_url(base: Option<&Url>, url: &str) -> BrowserResult<Url> {
    let resolved = match base {
        Some(base) => base.join(url),
        None => Url::parse(url),
    };
    resolved.map_err(|e| BrowserError::Navigation {
        url: url.to_string(),
        message: e.to_string(),
    })
}
