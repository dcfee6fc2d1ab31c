//! End-to-end crawls over in-memory sites
//!
//! These tests drive the public orchestrator and listing paginator against
//! `MemorySource`, so every page load is recorded and can be asserted on.

use crate::common::{
    listing_page, product_page, product_page_without_reviews, review_page, test_config, url,
};
use crate::recording::{RecordingBrowser, TabEvent};
use review_harvest::browser::{BrowsingContext, MemorySource, SessionStack, StaticBrowser};
use review_harvest::crawler::ListPaginator;
use review_harvest::output::{CrawlReport, StopReason};
use review_harvest::storage::{
    CsvStore, MemoryStore, RecordAccumulator, StorageError, StorageResult, TableStore,
};
use review_harvest::{CrawlOrchestrator, HarvestError, ListPhase, ProductRecord, ReviewRecord};
use std::time::Duration;
use tempfile::TempDir;

/// Site with one product per id, each with a single review page
fn simple_site(pages: &[&[u32]]) -> MemorySource {
    let mut source = MemorySource::new();
    for (n, items) in pages.iter().enumerate() {
        let path = if n == 0 {
            "/list".to_string()
        } else {
            format!("/list/{}", n + 1)
        };
        let next = if n + 1 < pages.len() {
            Some(format!("/list/{}", n + 2))
        } else {
            Some("disabled".to_string())
        };
        source.insert(&url(&path), listing_page(items, next.as_deref()));

        for &id in items.iter() {
            source.insert(&url(&format!("/p/{}", id)), product_page(id));
            source.insert(&url(&format!("/r/{}", id)), review_page(id, &[5, 4], None));
        }
    }
    source
}

#[tokio::test]
async fn test_crawl_terminates_after_last_listing_page() {
    let config = test_config(&url("/list"), "", "");
    let browser = StaticBrowser::new(simple_site(&[&[1], &[2], &[3]]));
    let mut orchestrator = CrawlOrchestrator::new(config, browser, MemoryStore::new());

    let report = orchestrator.run().await.unwrap();

    assert_eq!(report.pages_visited, 3);
    assert_eq!(report.items_seen, 3);
    assert_eq!(report.items_extracted, 3);
    assert_eq!(report.reviews_extracted, 6);
    assert_eq!(report.stop, Some(StopReason::LastPage));
    assert!(report.stop.as_ref().unwrap().is_complete());

    let accumulator = orchestrator.accumulator();
    assert_eq!(accumulator.products().len(), 3);
    assert_eq!(accumulator.flush_count(), 3);
    assert_eq!(accumulator.store().writes(), 3);
}

#[tokio::test]
async fn test_listing_page_limit_stops_early() {
    let config = test_config(&url("/list"), "max-list-pages = 2", "");
    let browser = StaticBrowser::new(simple_site(&[&[1], &[2], &[3]]));
    let mut orchestrator = CrawlOrchestrator::new(config, browser, MemoryStore::new());

    let report = orchestrator.run().await.unwrap();

    assert_eq!(report.pages_visited, 2);
    assert_eq!(report.stop, Some(StopReason::PageLimit(2)));
    assert_eq!(orchestrator.browser().source().fetch_count(&url("/list/3")), 0);
}

#[tokio::test]
async fn test_skip_threshold_is_per_item() {
    let config = test_config(&url("/list"), "skip-threshold = 1", "");
    let browser = StaticBrowser::new(simple_site(&[&[1, 2], &[3, 4]]));
    let mut orchestrator = CrawlOrchestrator::new(config, browser, MemoryStore::new());

    let report = orchestrator.run().await.unwrap();

    assert_eq!(report.items_seen, 4);
    assert_eq!(report.items_skipped, 1);
    assert_eq!(report.items_extracted, 3);

    let source = orchestrator.browser().source();
    assert_eq!(source.fetch_count(&url("/p/1")), 0);
    for id in 2..=4 {
        assert_eq!(source.fetch_count(&url(&format!("/p/{}", id))), 1);
    }

    let names: Vec<_> = orchestrator
        .accumulator()
        .products()
        .iter()
        .map(|p| p.name.clone().unwrap_or_default())
        .collect();
    assert_eq!(names, vec!["Product 2", "Product 3", "Product 4"]);
}

#[tokio::test]
async fn test_skip_threshold_bypasses_whole_pages() {
    let config = test_config(&url("/list"), "", "");
    let browser = StaticBrowser::new(simple_site(&[&[1, 2], &[3, 4]]));
    let mut orchestrator =
        CrawlOrchestrator::new(config, browser, MemoryStore::new()).with_skip_threshold(2);

    let report = orchestrator.run().await.unwrap();

    assert_eq!(report.pages_visited, 2);
    assert_eq!(report.items_skipped, 2);
    assert_eq!(report.items_extracted, 2);
    let source = orchestrator.browser().source();
    assert_eq!(source.fetch_count(&url("/p/1")), 0);
    assert_eq!(source.fetch_count(&url("/p/2")), 0);
}

#[tokio::test]
async fn test_review_order_across_pages() {
    let source = MemorySource::new()
        .with_page(&url("/list"), listing_page(&[7], None))
        .with_page(&url("/p/7"), product_page(7))
        .with_page(&url("/r/7"), review_page(7, &[5, 4, 3], Some("/r/7?page=2")))
        .with_page(&url("/r/7?page=2"), review_page(7, &[2, 1, 1], Some("disabled")));
    let config = test_config(&url("/list"), "", "");
    let mut orchestrator =
        CrawlOrchestrator::new(config, StaticBrowser::new(source), MemoryStore::new());

    let report = orchestrator.run().await.unwrap();
    assert_eq!(report.review_pages, 2);

    let reviews = orchestrator.accumulator().reviews();
    let indices: Vec<u32> = reviews.iter().map(|r| r.review_index).collect();
    assert_eq!(indices, vec![1, 2, 3, 4, 5, 6]);

    let ratings: Vec<Option<u8>> = reviews.iter().map(|r| r.rating).collect();
    assert_eq!(
        ratings,
        vec![Some(5), Some(4), Some(3), Some(2), Some(1), Some(1)]
    );
    assert!(reviews
        .iter()
        .all(|r| r.product_name.as_deref() == Some("Product 7")
            && r.product_model.as_deref() == Some("M-7")));
}

#[tokio::test]
async fn test_missing_fields_take_defaults() {
    let sparse_reviews = r#"<html><body>
        <ul class="reviews-list"><li class="review-item"><p>Nothing structured here</p></li></ul>
        </body></html>"#;
    let source = MemorySource::new()
        .with_page(&url("/list"), listing_page(&[1], None))
        .with_page(&url("/p/1"), product_page(1))
        .with_page(&url("/r/1"), sparse_reviews);
    let config = test_config(&url("/list"), "", "");
    let mut orchestrator =
        CrawlOrchestrator::new(config, StaticBrowser::new(source), MemoryStore::new());

    let report = orchestrator.run().await.unwrap();
    assert_eq!(report.items_extracted, 1);
    assert!(report.field_stats.tally("product.name").misses >= 1);

    let product = &orchestrator.accumulator().products()[0];
    assert_eq!(product.name, None);
    assert_eq!(product.price, None);

    let review = &orchestrator.accumulator().reviews()[0];
    assert_eq!(review.review_index, 1);
    assert_eq!(review.author, None);
    assert_eq!(review.rating, None);
    assert_eq!(review.submission_date, None);
    assert!(!review.verified_purchase);
    assert!(!review.recommendation);
    assert!(!review.promo_consideration);
    assert_eq!(review.image_count, 0);
    assert_eq!(review.helpful_count, 0);
    assert_eq!(review.unhelpful_count, 0);
}

#[tokio::test]
async fn test_tabs_balanced_after_item_failures() {
    // 1: product 404, 2: no reviews link, 3: reviews 404, 4: fine
    let mut source = MemorySource::new()
        .with_page(&url("/list"), listing_page(&[1, 2, 3, 4], Some("disabled")))
        .with_page(&url("/p/2"), product_page_without_reviews(2))
        .with_page(&url("/p/3"), product_page(3))
        .with_page(&url("/p/4"), product_page(4));
    source.insert(&url("/r/4"), review_page(4, &[3], None));

    let config = test_config(&url("/list"), "", "");
    let mut browser = StaticBrowser::new(source);
    browser.navigate(&url("/list")).await.unwrap();
    let mut session = SessionStack::new(browser.active_tab().unwrap());
    let mut accumulator = RecordAccumulator::new(MemoryStore::new());
    let mut report = CrawlReport::new();

    let mut paginator = ListPaginator::new(&config, 0);
    paginator
        .run(&mut browser, &mut session, &mut accumulator, &mut report)
        .await
        .unwrap();

    assert_eq!(paginator.state().phase(), ListPhase::Done);
    assert_eq!(report.items_failed, 2);
    assert_eq!(report.items_without_reviews, 1);
    assert_eq!(report.items_extracted, 1);

    assert_eq!(session.depth(), 1);
    assert_eq!(browser.tab_count(), 1);
    assert_eq!(browser.active_tab(), Some(session.main()));
    assert_eq!(accumulator.reviews().len(), 1);
}

#[tokio::test]
async fn test_incremental_tables_match_batch_write() {
    let dir = TempDir::new().unwrap();
    let products_path = dir.path().join("products.csv");
    let reviews_path = dir.path().join("reviews.csv");

    let config = test_config(&url("/list"), "", "");
    let browser = StaticBrowser::new(simple_site(&[&[1, 2], &[3]]));
    let store = CsvStore::new(&products_path, &reviews_path);
    let mut orchestrator = CrawlOrchestrator::new(config, browser, store);

    orchestrator.run().await.unwrap();
    let accumulator = orchestrator.accumulator();
    assert_eq!(accumulator.flush_count(), 3);

    let mut batch = CsvStore::new(dir.path().join("p_batch.csv"), dir.path().join("r_batch.csv"));
    batch
        .write_all(accumulator.products(), accumulator.reviews())
        .unwrap();

    assert_eq!(
        std::fs::read_to_string(&products_path).unwrap(),
        std::fs::read_to_string(batch.products_path()).unwrap()
    );
    assert_eq!(
        std::fs::read_to_string(&reviews_path).unwrap(),
        std::fs::read_to_string(batch.reviews_path()).unwrap()
    );

    let (products, reviews) = accumulator.store().load().unwrap();
    assert_eq!(products.len(), 3);
    assert_eq!(reviews.len(), 6);
}

#[tokio::test]
async fn test_snapshot_written_for_failed_item() {
    let dir = TempDir::new().unwrap();
    let snapshots = dir.path().join("snaps");
    let output = format!("snapshot-dir = \"{}\"", snapshots.display());

    // reviews page is missing, so the item fails on the product tab
    let source = MemorySource::new()
        .with_page(&url("/list"), listing_page(&[1], None))
        .with_page(&url("/p/1"), product_page(1));
    let config = test_config(&url("/list"), "", &output);
    let mut orchestrator =
        CrawlOrchestrator::new(config, StaticBrowser::new(source), MemoryStore::new());

    let report = orchestrator.run().await.unwrap();
    assert_eq!(report.items_failed, 1);

    let snapshot = std::fs::read_to_string(snapshots.join("item-1.html")).unwrap();
    assert!(snapshot.contains("See All Customer Reviews"));
}

#[tokio::test]
async fn test_shutdown_interrupts_and_tears_down_once() {
    let config = test_config(&url("/list"), "", "");
    let mut config = config;
    config.crawler.page_delay_ms = 200;

    let browser = StaticBrowser::new(simple_site(&[&[1, 2, 3]]));
    let mut orchestrator = CrawlOrchestrator::new(config, browser, MemoryStore::new());

    let report = orchestrator
        .run_until(tokio::time::sleep(Duration::from_millis(300)))
        .await
        .unwrap();

    assert!(report.was_interrupted());
    assert!(report.items_extracted < 3);
    assert_eq!(orchestrator.browser().tab_count(), 0);
    assert_eq!(orchestrator.browser().active_tab(), None);

    assert!(orchestrator.run().await.is_err());
}

#[tokio::test]
async fn test_unrendered_listing_ends_crawl_cleanly() {
    let source = MemorySource::new()
        .with_page(&url("/list"), "<html><body><p>Maintenance</p></body></html>");
    let config = test_config(&url("/list"), "", "");
    let mut orchestrator =
        CrawlOrchestrator::new(config, StaticBrowser::new(source), MemoryStore::new());

    let report = orchestrator.run().await.unwrap();

    assert_eq!(report.pages_visited, 0);
    assert!(matches!(
        report.stop,
        Some(StopReason::ListingUnavailable { page: 1, .. })
    ));
    assert_eq!(orchestrator.accumulator().flush_count(), 0);
}

#[tokio::test]
async fn test_every_opened_tab_is_closed() {
    // 1: two review pages, 2: product 404, 3: no reviews link
    let source = MemorySource::new()
        .with_page(&url("/list"), listing_page(&[1, 2, 3], Some("disabled")))
        .with_page(&url("/p/1"), product_page(1))
        .with_page(&url("/r/1"), review_page(1, &[5], Some("/r/1?page=2")))
        .with_page(&url("/r/1?page=2"), review_page(1, &[4], None))
        .with_page(&url("/p/3"), product_page_without_reviews(3));
    let config = test_config(&url("/list"), "", "");
    let browser = RecordingBrowser::new(StaticBrowser::new(source));
    let mut orchestrator = CrawlOrchestrator::new(config, browser, MemoryStore::new());

    let report = orchestrator.run().await.unwrap();
    assert_eq!(report.items_extracted, 1);
    assert_eq!(report.items_failed, 1);
    assert_eq!(report.items_without_reviews, 1);

    let browser = orchestrator.browser();
    // product, reviews and the review permalink tab
    assert_eq!(browser.opened(), 4);
    assert_eq!(browser.opened(), browser.closed());
    assert_eq!(browser.quits(), 1);
    assert_eq!(browser.events().last(), Some(&TabEvent::Quit));
}

#[tokio::test]
async fn test_nesting_never_exceeds_three_tabs() {
    let config = test_config(&url("/list"), "", "");
    let browser = RecordingBrowser::new(StaticBrowser::new(simple_site(&[&[1, 2], &[3]])));
    let mut orchestrator = CrawlOrchestrator::new(config, browser, MemoryStore::new());

    orchestrator.run().await.unwrap();

    let browser = orchestrator.browser();
    assert_eq!(browser.peak_depth(), 3);
    assert_eq!(browser.opened(), 6);
    assert_eq!(browser.closed(), 6);
}

/// Table store whose every write fails
struct FailingStore;

impl TableStore for FailingStore {
    fn write_all(&mut self, _: &[ProductRecord], _: &[ReviewRecord]) -> StorageResult<()> {
        Err(StorageError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk full",
        )))
    }

    fn load(&self) -> StorageResult<(Vec<ProductRecord>, Vec<ReviewRecord>)> {
        Ok((Vec::new(), Vec::new()))
    }

    fn location(&self) -> String {
        "failing".to_string()
    }
}

#[tokio::test]
async fn test_storage_failure_stops_crawl_and_tears_down() {
    let config = test_config(&url("/list"), "", "");
    let browser = RecordingBrowser::new(StaticBrowser::new(simple_site(&[&[1, 2]])));
    let mut orchestrator = CrawlOrchestrator::new(config, browser, FailingStore);

    let result = orchestrator.run().await;
    assert!(matches!(result, Err(HarvestError::Storage(_))));

    let browser = orchestrator.browser();
    assert_eq!(browser.opened(), 2);
    assert_eq!(browser.opened(), browser.closed());
    assert_eq!(browser.quits(), 1);
    assert_eq!(browser.events().last(), Some(&TabEvent::Quit));

    let source = browser.inner().source();
    assert_eq!(source.fetch_count(&url("/p/1")), 1);
    assert_eq!(source.fetch_count(&url("/p/2")), 0);
}
