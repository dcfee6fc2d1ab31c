//! Output module for crawl reports and table summaries
//!
//! This module handles:
//! - The per-run `CrawlReport` (traversal counters, stop reason, field
//!   extraction rates)
//! - Summaries of the persisted tables (`--stats`)

mod report;
pub mod stats;

pub use report::{print_report, CrawlReport, StopReason};
pub use stats::{load_summary, print_summary, TableSummary};
