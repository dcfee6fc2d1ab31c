//! CSV table backend
//!
//! Each flush writes the whole table to a sibling temp file and renames it
//! over the target, so a crash mid-write leaves the previous table intact.
//! The header row is always written, even for an empty table.

use super::traits::{StorageResult, TableStore};
use crate::extract::{ProductRecord, ReviewRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Products and reviews as two CSV files
#[derive(Debug, Clone)]
pub struct CsvStore {
    products_path: PathBuf,
    reviews_path: PathBuf,
}

impl CsvStore {
    pub fn new(products_path: impl Into<PathBuf>, reviews_path: impl Into<PathBuf>) -> Self {
        Self {
            products_path: products_path.into(),
            reviews_path: reviews_path.into(),
        }
    }

    pub fn products_path(&self) -> &Path {
        &self.products_path
    }

    pub fn reviews_path(&self) -> &Path {
        &self.reviews_path
    }
}

impl TableStore for CsvStore {
    fn write_all(
        &mut self,
        products: &[ProductRecord],
        reviews: &[ReviewRecord],
    ) -> StorageResult<()> {
        write_table(&self.products_path, ProductRecord::COLUMNS, products)?;
        write_table(&self.reviews_path, ReviewRecord::COLUMNS, reviews)?;
        Ok(())
    }

    fn load(&self) -> StorageResult<(Vec<ProductRecord>, Vec<ReviewRecord>)> {
        Ok((
            read_table(&self.products_path)?,
            read_table(&self.reviews_path)?,
        ))
    }

    fn location(&self) -> String {
        format!(
            "{} + {}",
            self.products_path.display(),
            self.reviews_path.display()
        )
    }
}

fn write_table<T: Serialize>(path: &Path, columns: &[&str], rows: &[T]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(&tmp)?;
    writer.write_record(columns)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    drop(writer);

    fs::rename(&tmp, path)?;
    Ok(())
}

fn read_table<T: DeserializeOwned>(path: &Path) -> StorageResult<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}
