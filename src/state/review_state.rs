//! Review pagination state
use std::fmt;

/// Phase of one product's review pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewPhase {
    /// Waiting for the review list and extracting its items
    FetchingPage,

    /// Looking for (and following) the "next page" control
    HasNext,

    Done,
}

impl ReviewPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchingPage => "fetching_page",
            Self::HasNext => "has_next",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for ReviewPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Position within one product's review pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewProgress {
    phase: ReviewPhase,
    pages_fetched: u32,
    first_page: bool,
    next_index: u32,
}

impl Default for ReviewProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ReviewProgress {
    pub fn new() -> Self {
        Self {
            phase: ReviewPhase::FetchingPage,
            pages_fetched: 0,
            first_page: true,
            next_index: 1,
        }
    }

    pub fn phase(&self) -> ReviewPhase {
        self.phase
    }

    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    /// True until the first "next" control has been followed
    pub fn on_first_page(&self) -> bool {
        self.first_page
    }

    /// review_index for the next extracted review
    pub fn next_index(&self) -> u32 {
        self.next_index
    }

    /// Records a fetched page holding `count` reviews and moves to `HasNext`
    pub fn page_fetched(&mut self, count: usize) {
        if self.phase != ReviewPhase::FetchingPage {
            return;
        }
        self.pages_fetched += 1;
        self.next_index += count as u32;
        self.phase = ReviewPhase::HasNext;
    }

    /// Followed a "next" control; back to `FetchingPage`
    pub fn advanced(&mut self) {
        if self.phase != ReviewPhase::HasNext {
            return;
        }
        self.first_page = false;
        self.phase = ReviewPhase::FetchingPage;
    }

    pub fn finish(&mut self) {
        self.phase = ReviewPhase::Done;
    }
}
