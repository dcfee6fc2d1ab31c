//! Review pagination for one product
//!
//! The first "next" control of a review list is a page-scoped permalink, so
//! page 2 is opened in a fresh tab that takes the reviews tab's place on the
//! session stack. From page 2 on the control paginates in place and is
//! clicked.

use super::{is_disabled, throttle};
use crate::browser::{BrowserError, BrowserResult, BrowsingContext, SessionStack};
use crate::config::{CrawlerConfig, ReviewSelectors};
use crate::extract::{ExtractionStats, RecordBuilder, ReviewRecord};
use crate::state::{ReviewPhase, ReviewProgress};
use std::time::Duration;

/// Reviews gathered for one product
#[derive(Debug, Clone, Default)]
pub struct ReviewBatch {
    /// In page order, each page in document order
    pub reviews: Vec<ReviewRecord>,
    pub pages: u32,
}

/// Drives the review-list state machine in the active (reviews) tab
pub struct ReviewPaginator<'a> {
    selectors: &'a ReviewSelectors,
    builder: RecordBuilder<'a>,
    wait_timeout: Duration,
    page_delay: Duration,
    max_pages: Option<u32>,
}

impl<'a> ReviewPaginator<'a> {
    pub fn new(selectors: &'a ReviewSelectors, builder: RecordBuilder<'a>, crawler: &CrawlerConfig) -> Self {
        Self {
            selectors,
            builder,
            wait_timeout: Duration::from_millis(crawler.wait_timeout_ms),
            page_delay: Duration::from_millis(crawler.page_delay_ms),
            max_pages: crawler.max_review_pages,
        }
    }

    /// Collects every review reachable from the active tab
    ///
    /// Never fails: a review list that doesn't render or a "next" control
    /// that can't be followed ends pagination with what was gathered so far.
    pub async fn collect<B: BrowsingContext>(
        &self,
        browser: &mut B,
        session: &mut SessionStack,
        stats: &mut ExtractionStats,
    ) -> ReviewBatch {
        let mut progress = ReviewProgress::new();
        let mut reviews = Vec::new();

        loop {
            match progress.phase() {
                ReviewPhase::FetchingPage => {
                    match self.fetch_page(&*browser, progress.next_index(), stats).await {
                        Ok(batch) => {
                            tracing::debug!(
                                page = progress.pages_fetched() + 1,
                                reviews = batch.len(),
                                "Extracted review page"
                            );
                            progress.page_fetched(batch.len());
                            reviews.extend(batch);

                            if let Some(max) = self.max_pages {
                                if progress.pages_fetched() >= max {
                                    tracing::debug!(max, "Review page limit reached");
                                    progress.finish();
                                }
                            }
                        }
                        Err(e) => {
                            tracing::warn!(
                                page = progress.pages_fetched() + 1,
                                "Review list did not render: {}",
                                e
                            );
                            progress.finish();
                        }
                    }
                }
                ReviewPhase::HasNext => {
                    match self
                        .follow_next(browser, session, progress.on_first_page())
                        .await
                    {
                        Ok(true) => {
                            progress.advanced();
                            throttle(self.page_delay).await;
                        }
                        Ok(false) => progress.finish(),
                        Err(e) => {
                            tracing::warn!(
                                page = progress.pages_fetched(),
                                "Review pagination stopped: {}",
                                e
                            );
                            progress.finish();
                        }
                    }
                }
                ReviewPhase::Done => break,
            }
        }

        ReviewBatch {
            reviews,
            pages: progress.pages_fetched(),
        }
    }

    async fn fetch_page<B: BrowsingContext>(
        &self,
        browser: &B,
        first_index: u32,
        stats: &mut ExtractionStats,
    ) -> BrowserResult<Vec<ReviewRecord>> {
        let list = browser
            .wait_for(&self.selectors.list, self.wait_timeout)
            .await?;
        let items = browser.find_all_within(&list, &self.selectors.item).await?;

        Ok(self
            .builder
            .build_reviews(browser, &items, first_index, stats)
            .await)
    }

    /// Follows the "next page" control; `Ok(false)` when there is none
    async fn follow_next<B: BrowsingContext>(
        &self,
        browser: &mut B,
        session: &mut SessionStack,
        first_page: bool,
    ) -> BrowserResult<bool> {
        let Some(next) = browser.find_one(&self.selectors.next).await? else {
            tracing::debug!("No next review page");
            return Ok(false);
        };
        if is_disabled(&*browser, &next).await? {
            tracing::debug!("Next review page control is disabled");
            return Ok(false);
        }

        let link = browser
            .find_within(&next, &self.selectors.next_link)
            .await?;

        if first_page {
            let link = link.ok_or_else(|| BrowserError::NotClickable(next.to_string()))?;
            let href = browser
                .attribute(&link, "href")
                .await?
                .ok_or_else(|| BrowserError::NotClickable(link.to_string()))?;
            tracing::debug!(url = %href, "Opening review permalink in a new tab");
            session.replace_top(browser, &href).await?;
        } else {
            let target = link.unwrap_or(next);
            browser.click(&target).await?;
            browser
                .wait_for(&self.selectors.list, self.wait_timeout)
                .await?;
        }

        Ok(true)
    }
}
