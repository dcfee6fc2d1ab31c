//! Listing traversal
//!
//! Walks the paginated listing in the main window. Each item past the skip
//! threshold is visited in nested tabs (product, then reviews); the tabs are
//! unwound on every exit path before the next item starts.

use super::reviews::ReviewPaginator;
use super::{is_disabled, throttle};
use crate::browser::{BrowserError, BrowserResult, BrowsingContext, ElementHandle, SessionStack};
use crate::config::{Config, CrawlerConfig, ListingSelectors};
use crate::extract::{ExtractionStats, ProductRecord, RecordBuilder, ReviewRecord};
use crate::output::{CrawlReport, StopReason};
use crate::state::{CrawlState, ListPhase};
use crate::storage::{RecordAccumulator, TableStore};
use crate::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What happened to one listing item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Product and reviews were flushed
    Stored { reviews: usize, review_pages: u32 },

    /// The product page had no reviews link; nothing was emitted
    NoReviewsLink,

    /// Navigation failed; nothing was emitted
    Failed,
}

/// Records gathered from one item's tabs
struct Visited {
    product: ProductRecord,
    reviews: Vec<ReviewRecord>,
    review_pages: u32,
}

/// Drives the listing state machine over the main window
pub struct ListPaginator<'a> {
    crawler: &'a CrawlerConfig,
    listing: &'a ListingSelectors,
    builder: RecordBuilder<'a>,
    reviews: ReviewPaginator<'a>,
    snapshot_dir: Option<PathBuf>,
    wait_timeout: Duration,
    page_delay: Duration,
    state: CrawlState,
}

impl<'a> ListPaginator<'a> {
    pub fn new(config: &'a Config, skip_threshold: u64) -> Self {
        let crawler = &config.crawler;
        let field_timeout = Duration::from_millis(crawler.field_timeout_ms);
        let builder = RecordBuilder::new(&config.selectors, field_timeout);

        Self {
            crawler,
            listing: &config.selectors.listing,
            builder: builder.clone(),
            reviews: ReviewPaginator::new(&config.selectors.review, builder, crawler),
            snapshot_dir: config.output.snapshot_dir.as_ref().map(PathBuf::from),
            wait_timeout: Duration::from_millis(crawler.wait_timeout_ms),
            page_delay: Duration::from_millis(crawler.page_delay_ms),
            state: CrawlState::new(skip_threshold),
        }
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    /// Runs the traversal from the listing page loaded in the main window
    ///
    /// Item-level failures are counted and skipped. Only fatal errors
    /// (storage, a closed browser) are returned; the session is back at the
    /// main window either way.
    pub async fn run<B, S>(
        &mut self,
        browser: &mut B,
        session: &mut SessionStack,
        accumulator: &mut RecordAccumulator<S>,
        report: &mut CrawlReport,
    ) -> Result<()>
    where
        B: BrowsingContext,
        S: TableStore,
    {
        while !self.state.is_done() {
            match self.state.phase() {
                ListPhase::ScanningPage => self.scan_page(browser, session, accumulator, report).await?,
                ListPhase::BelowSkip | ListPhase::ProcessingItems => {
                    self.state.transition(ListPhase::Advancing)?;
                }
                ListPhase::Advancing => self.advance(browser, report).await?,
                ListPhase::Done => break,
            }
        }

        tracing::info!(
            pages = self.state.page(),
            items = self.state.items_seen(),
            "Listing traversal finished"
        );
        Ok(())
    }

    /// Enumerates the current page and processes the items past the threshold
    async fn scan_page<B, S>(
        &mut self,
        browser: &mut B,
        session: &mut SessionStack,
        accumulator: &mut RecordAccumulator<S>,
        report: &mut CrawlReport,
    ) -> Result<()>
    where
        B: BrowsingContext,
        S: TableStore,
    {
        let page = self.state.page();
        let items = match self.enumerate_items(&*browser).await {
            Ok(items) => items,
            Err(e) => {
                tracing::error!(page, "Listing page did not render: {}", e);
                report.stop = Some(StopReason::ListingUnavailable {
                    page,
                    reason: e.to_string(),
                });
                self.state.finish();
                return Ok(());
            }
        };

        let first_index = self.state.record_scanned(items.len());
        report.pages_visited += 1;
        report.items_seen = self.state.items_seen();
        tracing::info!(page, items = items.len(), total = self.state.items_seen(), "Scanned listing page");

        if self.state.below_skip() {
            tracing::info!(
                page,
                skip_threshold = self.state.skip_threshold(),
                "Page within skip threshold, bypassing"
            );
            report.items_skipped += items.len() as u64;
            return self.state.transition(ListPhase::BelowSkip);
        }

        self.state.transition(ListPhase::ProcessingItems)?;
        for (offset, item) in items.iter().enumerate() {
            let index = first_index + offset as u64;
            if self.state.skips(index) {
                report.items_skipped += 1;
                continue;
            }

            match self
                .process_item(browser, session, accumulator, &mut report.field_stats, item, index)
                .await?
            {
                ItemOutcome::Stored {
                    reviews,
                    review_pages,
                } => {
                    report.items_extracted += 1;
                    report.reviews_extracted += reviews as u64;
                    report.review_pages += review_pages as u64;
                }
                ItemOutcome::NoReviewsLink => report.items_without_reviews += 1,
                ItemOutcome::Failed => report.items_failed += 1,
            }
        }

        Ok(())
    }

    async fn enumerate_items<B: BrowsingContext>(&self, browser: &B) -> BrowserResult<Vec<ElementHandle>> {
        browser
            .wait_for(&self.listing.item, self.wait_timeout)
            .await?;
        browser.find_all(&self.listing.item).await
    }

    /// Visits one item in nested tabs and flushes its records
    ///
    /// The session is unwound to its entry depth whatever happens. Returns
    /// `Err` only for fatal errors.
    pub async fn process_item<B, S>(
        &self,
        browser: &mut B,
        session: &mut SessionStack,
        accumulator: &mut RecordAccumulator<S>,
        stats: &mut ExtractionStats,
        item: &ElementHandle,
        index: u64,
    ) -> Result<ItemOutcome>
    where
        B: BrowsingContext,
        S: TableStore,
    {
        let entry_depth = session.depth();

        let result: Result<ItemOutcome> = async {
            match self.visit(browser, session, stats, item).await? {
                Some(visited) => {
                    let outcome = ItemOutcome::Stored {
                        reviews: visited.reviews.len(),
                        review_pages: visited.review_pages,
                    };
                    accumulator.append(visited.product, visited.reviews)?;
                    Ok(outcome)
                }
                None => Ok(ItemOutcome::NoReviewsLink),
            }
        }
        .await;

        if let Err(e) = &result {
            if !e.is_fatal() {
                self.capture_snapshot(&*browser, index).await;
            }
        }

        let unwound = session.unwind_to(browser, entry_depth).await;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!(item = index, "Item failed: {}", e);
                ItemOutcome::Failed
            }
        };

        if let Err(e) = unwound {
            if e.is_fatal() {
                return Err(e.into());
            }
            tracing::warn!(item = index, "Tabs left open after item: {}", e);
        }

        match outcome {
            ItemOutcome::Stored { reviews, .. } => {
                tracing::info!(item = index, reviews, "Stored item")
            }
            ItemOutcome::NoReviewsLink => {
                tracing::warn!(item = index, "No reviews link on product page, skipping")
            }
            ItemOutcome::Failed => {}
        }
        Ok(outcome)
    }

    /// Product tab, then reviews tab; `None` when there is no reviews link
    async fn visit<B: BrowsingContext>(
        &self,
        browser: &mut B,
        session: &mut SessionStack,
        stats: &mut ExtractionStats,
        item: &ElementHandle,
    ) -> Result<Option<Visited>> {
        let product_url = self.item_target(&*browser, item).await?;
        session.push(browser, &product_url).await?;
        throttle(self.page_delay).await;

        let link = tokio::time::timeout(
            self.wait_timeout,
            browser.find_containing(&self.listing.reviews_link, &self.listing.reviews_link_text),
        )
        .await
        .ok()
        .transpose()?
        .flatten();
        let Some(link) = link else {
            return Ok(None);
        };
        let reviews_url = browser
            .attribute(&link, "href")
            .await?
            .ok_or_else(|| BrowserError::NotClickable(link.to_string()))?;

        session.push(browser, &reviews_url).await?;
        throttle(self.page_delay).await;

        let product = self.builder.build_product(&*browser, stats).await;
        let batch = self.reviews.collect(browser, session, stats).await;
        tracing::debug!(
            name = product.name.as_deref().unwrap_or("-"),
            reviews = batch.reviews.len(),
            pages = batch.pages,
            "Extracted product"
        );

        let reviews = batch
            .reviews
            .into_iter()
            .map(|review| review.with_product(&product))
            .collect();
        Ok(Some(Visited {
            product,
            reviews,
            review_pages: batch.pages,
        }))
    }

    /// URL behind the item's primary link
    async fn item_target<B: BrowsingContext>(&self, browser: &B, item: &ElementHandle) -> BrowserResult<String> {
        let link = browser
            .find_within(item, &self.listing.item_link)
            .await?
            .ok_or_else(|| BrowserError::NotClickable(item.to_string()))?;
        browser
            .attribute(&link, "href")
            .await?
            .filter(|href| !href.is_empty())
            .ok_or_else(|| BrowserError::NotClickable(link.to_string()))
    }

    /// Follows the listing's "next" control, or finishes the traversal
    async fn advance<B: BrowsingContext>(&mut self, browser: &mut B, report: &mut CrawlReport) -> Result<()> {
        let page = self.state.page();

        if let Some(max) = self.crawler.max_list_pages {
            if page >= max {
                tracing::info!(max, "Listing page limit reached");
                report.stop = Some(StopReason::PageLimit(max));
                self.state.finish();
                return Ok(());
            }
        }

        match self.follow_next(browser).await {
            Ok(true) => {
                throttle(self.page_delay).await;
                self.state.next_page()?;
                tracing::info!(page = self.state.page(), "Navigated to next listing page");
            }
            Ok(false) => {
                tracing::info!(page, "Reached last listing page");
                report.stop = Some(StopReason::LastPage);
                self.state.finish();
            }
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                tracing::error!(page, "Listing pagination failed: {}", e);
                report.stop = Some(StopReason::AdvanceFailed {
                    page,
                    reason: e.to_string(),
                });
                self.state.finish();
            }
        }
        Ok(())
    }

    async fn follow_next<B: BrowsingContext>(&self, browser: &mut B) -> BrowserResult<bool> {
        let Some(next) = browser.find_one(&self.listing.next).await? else {
            return Ok(false);
        };
        if is_disabled(&*browser, &next).await? {
            return Ok(false);
        }
        browser.click(&next).await?;
        Ok(true)
    }

    /// Writes the active tab's snapshot for a failed item, if configured
    async fn capture_snapshot<B: BrowsingContext>(&self, browser: &B, index: u64) {
        let Some(dir) = &self.snapshot_dir else {
            return;
        };

        let bytes = match browser.snapshot().await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(item = index, "Snapshot failed: {}", e);
                return;
            }
        };

        let path = snapshot_path(dir, index);
        let written = async {
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(&path, bytes).await
        }
        .await;

        match written {
            Ok(()) => tracing::info!(item = index, path = %path.display(), "Saved snapshot"),
            Err(e) => tracing::warn!(item = index, "Failed to write snapshot: {}", e),
        }
    }
}

fn snapshot_path(dir: &Path, index: u64) -> PathBuf {
    dir.join(format!("item-{}.html", index))
}
