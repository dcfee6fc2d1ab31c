//! Storage module for persisting extracted records
//!
//! This module handles durable bookkeeping for the crawler, including:
//! - The `TableStore` interface over a products table and a reviews table
//! - CSV and SQLite backends
//! - `RecordAccumulator`, which deduplicates and rewrites both tables after
//!   every completed item

mod accumulator;
mod csv_store;
mod schema;
mod sqlite_store;
mod traits;

pub use accumulator::RecordAccumulator;
pub use csv_store::CsvStore;
pub use sqlite_store::SqliteStore;
pub use traits::{MemoryStore, StorageError, StorageResult, TableStore};

use crate::config::{OutputConfig, OutputFormat};
use crate::extract::{ProductRecord, ReviewRecord};
use std::path::Path;

/// Table backend selected by the output configuration
pub enum OutputStore {
    Csv(CsvStore),
    Sqlite(SqliteStore),
}

impl TableStore for OutputStore {
    fn write_all(
        &mut self,
        products: &[ProductRecord],
        reviews: &[ReviewRecord],
    ) -> StorageResult<()> {
        match self {
            Self::Csv(store) => store.write_all(products, reviews),
            Self::Sqlite(store) => store.write_all(products, reviews),
        }
    }

    fn load(&self) -> StorageResult<(Vec<ProductRecord>, Vec<ReviewRecord>)> {
        match self {
            Self::Csv(store) => store.load(),
            Self::Sqlite(store) => store.load(),
        }
    }

    fn location(&self) -> String {
        match self {
            Self::Csv(store) => store.location(),
            Self::Sqlite(store) => store.location(),
        }
    }
}

/// Opens the configured backend, expanding `{skip}` in its paths
///
/// # Arguments
///
/// * `output` - Output section of the configuration
/// * `skip` - Skip threshold of this run
pub fn open_store(output: &OutputConfig, skip: u64) -> StorageResult<OutputStore> {
    match output.format {
        OutputFormat::Csv => Ok(OutputStore::Csv(CsvStore::new(
            output.products_path_for(skip),
            output.reviews_path_for(skip),
        ))),
        OutputFormat::Sqlite => {
            let path = output.database_path_for(skip);
            Ok(OutputStore::Sqlite(SqliteStore::open(Path::new(&path))?))
        }
    }
}
