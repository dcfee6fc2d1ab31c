//! Storage traits and error types
//!
//! This module defines the trait interface for table backends and
//! associated error types.

use crate::extract::{ProductRecord, ReviewRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Malformed stored value in {column}: {value}")]
    Malformed { column: String, value: String },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A durable pair of tables: products and their reviews
///
/// Writes replace both tables in full; there is no append path.
pub trait TableStore {
    /// Replaces both persisted tables with `products` and `reviews`
    fn write_all(&mut self, products: &[ProductRecord], reviews: &[ReviewRecord])
        -> StorageResult<()>;

    /// Loads both persisted tables; missing tables read as empty
    fn load(&self) -> StorageResult<(Vec<ProductRecord>, Vec<ReviewRecord>)>;

    /// Where the tables live, for log lines
    fn location(&self) -> String;
}

/// Volatile [`TableStore`] that keeps the last write in memory
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    products: Vec<ProductRecord>,
    reviews: Vec<ReviewRecord>,
    writes: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of full-table writes so far
    pub fn writes(&self) -> u64 {
        self.writes
    }
}

impl TableStore for MemoryStore {
    fn write_all(
        &mut self,
        products: &[ProductRecord],
        reviews: &[ReviewRecord],
    ) -> StorageResult<()> {
        self.products = products.to_vec();
        self.reviews = reviews.to_vec();
        self.writes += 1;
        Ok(())
    }

    fn load(&self) -> StorageResult<(Vec<ProductRecord>, Vec<ReviewRecord>)> {
        Ok((self.products.clone(), self.reviews.clone()))
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
