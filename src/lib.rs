//! Review-Harvest: a product and review crawler
//!
//! This crate walks a paginated product listing, opens every listed product
//! in its own tab, follows the product's review page and paginates through
//! all of its reviews. Each finished product is flushed to disk before the
//! next one starts, so an interrupted crawl can be resumed with a skip
//! threshold.

pub mod browser;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Review-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Browser error: {0}")]
    Browser(#[from] browser::BrowserError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition {
        from: state::ListPhase,
        to: state::ListPhase,
    },

    #[error("Browser teardown failed: {0}")]
    Teardown(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarvestError {
    /// Returns true if the crawl can't continue after this error
    ///
    /// Item-level problems (a product page that won't load, a missing
    /// element) are recoverable: the item is dropped and the crawl moves on.
    /// Losing the output store or the browser itself is not.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Storage(_)
            | Self::Reqwest(_)
            | Self::Io(_)
            | Self::Teardown(_)
            | Self::Config(_)
            | Self::InvalidTransition { .. } => true,
            Self::Browser(e) => e.is_fatal(),
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector '{selector}' for {field}")]
    InvalidSelector { field: String, selector: String },
}

/// Result type alias for Review-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use browser::{BrowserError, BrowsingContext, ElementHandle, SessionStack, TabHandle};
pub use config::Config;
pub use crawler::{run_crawl, CrawlOrchestrator};
pub use extract::{ProductRecord, ReviewRecord};
pub use output::CrawlReport;
pub use state::{CrawlState, ListPhase, ReviewPhase, ReviewProgress};
pub use storage::RecordAccumulator;
