//! Listing traversal state
use crate::{HarvestError, Result};
use std::fmt;

/// Phase of the outer listing state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListPhase {
    /// Enumerating the items of the current listing page
    ScanningPage,

    /// Every item seen so far is within the skip threshold
    BelowSkip,

    /// Extracting the page's items past the skip threshold
    ProcessingItems,

    /// Following the listing's "next" control
    Advancing,

    /// No further listing pages
    Done,
}

impl ListPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if the machine may move from `self` to `next`
    ///
    /// Any live phase may stop early (shutdown, listing failure, page bound).
    pub fn can_transition_to(&self, next: ListPhase) -> bool {
        use ListPhase::*;
        match (self, next) {
            (Done, _) => false,
            (_, Done) => true,
            (ScanningPage, BelowSkip) | (ScanningPage, ProcessingItems) => true,
            (BelowSkip, Advancing) | (ProcessingItems, Advancing) => true,
            (Advancing, ScanningPage) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ScanningPage => "scanning_page",
            Self::BelowSkip => "below_skip",
            Self::ProcessingItems => "processing_items",
            Self::Advancing => "advancing",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for ListPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Listing progress: page number, cumulative item counter and skip threshold
///
/// Page number and item counter never decrease.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlState {
    page: u32,
    items_seen: u64,
    skip_threshold: u64,
    phase: ListPhase,
}

impl CrawlState {
    pub fn new(skip_threshold: u64) -> Self {
        Self {
            page: 1,
            items_seen: 0,
            skip_threshold,
            phase: ListPhase::ScanningPage,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn items_seen(&self) -> u64 {
        self.items_seen
    }

    pub fn skip_threshold(&self) -> u64 {
        self.skip_threshold
    }

    pub fn phase(&self) -> ListPhase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Moves to `next`, rejecting edges the machine doesn't have
    pub fn transition(&mut self, next: ListPhase) -> Result<()> {
        if !self.phase.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        self.phase = next;
        Ok(())
    }

    /// Counts the items found on the current page
    ///
    /// Returns the cumulative index of the page's first item.
    pub fn record_scanned(&mut self, count: usize) -> u64 {
        let first = self.items_seen + 1;
        self.items_seen += count as u64;
        first
    }

    /// True while every item seen so far is within the skip threshold
    pub fn below_skip(&self) -> bool {
        self.items_seen <= self.skip_threshold
    }

    /// True if the item at this cumulative index must be bypassed
    pub fn skips(&self, cumulative_index: u64) -> bool {
        cumulative_index <= self.skip_threshold
    }

    /// Enters the next listing page
    pub fn next_page(&mut self) -> Result<()> {
        self.transition(ListPhase::ScanningPage)?;
        self.page += 1;
        Ok(())
    }

    /// Stops the traversal from any live phase; no-op once done
    pub fn finish(&mut self) {
        self.phase = ListPhase::Done;
    }
}
