//! Per-run crawl report
use crate::extract::ExtractionStats;
use std::fmt;
use std::time::Duration;

/// Why the listing traversal ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The listing's "next" control was absent or disabled
    LastPage,

    /// `max-list-pages` was reached
    PageLimit(u32),

    /// The start page could not be loaded
    StartFailed(String),

    /// A listing page did not render its items
    ListingUnavailable { page: u32, reason: String },

    /// Following the "next" control failed
    AdvanceFailed { page: u32, reason: String },

    /// Shutdown was requested
    Interrupted,
}

impl StopReason {
    /// True when the traversal reached the end of the listing on its own
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::LastPage | Self::PageLimit(_))
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LastPage => write!(f, "reached the last listing page"),
            Self::PageLimit(limit) => write!(f, "reached the limit of {} listing pages", limit),
            Self::StartFailed(reason) => write!(f, "start page failed to load: {}", reason),
            Self::ListingUnavailable { page, reason } => {
                write!(f, "listing page {} did not render: {}", page, reason)
            }
            Self::AdvanceFailed { page, reason } => {
                write!(f, "could not advance past listing page {}: {}", page, reason)
            }
            Self::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Counters gathered while a crawl runs
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    pub pages_visited: u32,
    pub items_seen: u64,
    pub items_skipped: u64,
    pub items_extracted: u64,
    /// Items whose product page had no reviews link
    pub items_without_reviews: u64,
    pub items_failed: u64,
    pub reviews_extracted: u64,
    pub review_pages: u64,
    pub stop: Option<StopReason>,
    pub field_stats: ExtractionStats,
    pub elapsed: Duration,
}

impl CrawlReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Items that reached extraction, whatever the outcome
    pub fn items_attempted(&self) -> u64 {
        self.items_extracted + self.items_without_reviews + self.items_failed
    }

    pub fn was_interrupted(&self) -> bool {
        matches!(self.stop, Some(StopReason::Interrupted))
    }
}

/// Prints the report to stdout in a formatted manner
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    println!("Traversal:");
    println!("  Listing pages visited: {}", report.pages_visited);
    println!("  Items seen: {}", report.items_seen);
    println!("  Items skipped: {}", report.items_skipped);
    match &report.stop {
        Some(reason) => println!("  Stopped: {}", reason),
        None => println!("  Stopped: unknown"),
    }
    println!("  Elapsed: {:.1}s", report.elapsed.as_secs_f64());
    println!();

    println!("Items:");
    println!("  Extracted: {}", report.items_extracted);
    println!("  Without reviews link: {}", report.items_without_reviews);
    println!("  Failed: {}", report.items_failed);
    println!(
        "  Reviews: {} across {} review pages",
        report.reviews_extracted, report.review_pages
    );
    println!();

    if !report.field_stats.is_empty() {
        println!("Field Extraction Rates:");
        for (field, tally) in report.field_stats.fields() {
            println!(
                "  {:<28} {:>5.1}% ({} / {})",
                field,
                tally.hit_rate() * 100.0,
                tally.hits,
                tally.attempts()
            );
        }
        println!();
    }
}
