//! Crawl state machines
//!
//! # Components
//!
//! - `ListPhase`/`CrawlState`: the outer listing traversal (page number,
//!   cumulative item counter, skip threshold)
//! - `ReviewPhase`/`ReviewProgress`: the nested review pagination of one product

mod list_state;
mod review_state;

pub use list_state::{CrawlState, ListPhase};
pub use review_state::{ReviewPhase, ReviewProgress};
