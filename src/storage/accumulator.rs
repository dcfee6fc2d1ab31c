//! Incremental, deduplicating record accumulation

use super::traits::{StorageResult, TableStore};
use crate::extract::{ProductRecord, ReviewRecord};
use std::collections::HashSet;
use std::hash::Hash;

/// In-memory product and review tables, persisted in full after every item
///
/// A crash loses at most the item in flight: every completed `append` has
/// already been written through to the store.
pub struct RecordAccumulator<S> {
    store: S,
    products: Vec<ProductRecord>,
    reviews: Vec<ReviewRecord>,
    flushes: u64,
}

impl<S: TableStore> RecordAccumulator<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            products: Vec::new(),
            reviews: Vec::new(),
            flushes: 0,
        }
    }

    /// Adds one item's records, drops identical rows and rewrites the store
    pub fn append(&mut self, product: ProductRecord, reviews: Vec<ReviewRecord>) -> StorageResult<()> {
        self.products.push(product);
        self.reviews.extend(reviews);
        dedup(&mut self.products);
        dedup(&mut self.reviews);
        self.flush()
    }

    /// Rewrites the store with the current tables
    pub fn flush(&mut self) -> StorageResult<()> {
        self.store.write_all(&self.products, &self.reviews)?;
        self.flushes += 1;
        tracing::debug!(
            products = self.products.len(),
            reviews = self.reviews.len(),
            location = %self.store.location(),
            "Flushed tables"
        );
        Ok(())
    }

    pub fn products(&self) -> &[ProductRecord] {
        &self.products
    }

    pub fn reviews(&self) -> &[ReviewRecord] {
        &self.reviews
    }

    pub fn flush_count(&self) -> u64 {
        self.flushes
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

/// Removes repeated rows, keeping the first occurrence in place
fn dedup<T: Hash + Eq + Clone>(rows: &mut Vec<T>) {
    let mut seen = HashSet::with_capacity(rows.len());
    rows.retain(|row| seen.insert(row.clone()));
}
