//! Crawl engine
//!
//! This module contains the crawl state machines, including:
//! - `ListPaginator`: the outer listing traversal with per-item tab nesting
//! - `ReviewPaginator`: one product's review pagination
//! - `CrawlOrchestrator`: start page, entry click, shutdown and teardown

mod list;
mod orchestrator;
mod reviews;

pub use list::{ItemOutcome, ListPaginator};
pub use orchestrator::{run_crawl, run_crawl_until, CrawlOrchestrator};
pub use reviews::{ReviewBatch, ReviewPaginator};

use crate::browser::{BrowserResult, BrowsingContext, ElementHandle};
use std::time::Duration;

/// Returns true if a pagination control is marked disabled
///
/// Checks the `disabled` class token, the `disabled` attribute and
/// `aria-disabled="true"`.
pub async fn is_disabled<B: BrowsingContext>(
    browser: &B,
    element: &ElementHandle,
) -> BrowserResult<bool> {
    let class = browser.attribute(element, "class").await?.unwrap_or_default();
    if class.split_whitespace().any(|token| token == "disabled") {
        return Ok(true);
    }
    if browser.attribute(element, "disabled").await?.is_some() {
        return Ok(true);
    }
    Ok(browser
        .attribute(element, "aria-disabled")
        .await?
        .is_some_and(|value| value.eq_ignore_ascii_case("true")))
}

/// Fixed pause after a page transition
pub(crate) async fn throttle(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
