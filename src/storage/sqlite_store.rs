//! SQLite table backend
//!
//! Both tables are replaced inside one transaction per flush.

use super::schema::initialize_schema;
use super::traits::{StorageError, StorageResult, TableStore};
use crate::extract::{ProductRecord, ReviewRecord};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Products and reviews as two tables of one SQLite database
pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Opens or creates the database at `path`
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;
        initialize_schema(&conn)?;

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn, path: None })
    }
}

impl TableStore for SqliteStore {
    fn write_all(
        &mut self,
        products: &[ProductRecord],
        reviews: &[ReviewRecord],
    ) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM products", [])?;
        tx.execute("DELETE FROM reviews", [])?;

        {
            let mut insert = tx.prepare(
                "INSERT INTO products (name, model, sku_model, price, savings, comp_value)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for p in products {
                insert.execute(params![
                    p.name,
                    p.model,
                    p.sku_model,
                    p.price,
                    p.savings,
                    p.comp_value
                ])?;
            }

            let mut insert = tx.prepare(
                "INSERT INTO reviews (product_name, product_model, review_index, author, rating,
                 review_title, verified_purchase, submission_date, ownership_duration,
                 promo_consideration, review_text, image_count, recommendation, helpful_count,
                 unhelpful_count, brand_response, brand_response_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            )?;
            for r in reviews {
                insert.execute(params![
                    r.product_name,
                    r.product_model,
                    r.review_index,
                    r.author,
                    r.rating,
                    r.title,
                    r.verified_purchase,
                    format_timestamp(r.submission_date),
                    r.ownership_duration,
                    r.promo_consideration,
                    r.body,
                    r.image_count,
                    r.recommendation,
                    r.helpful_count,
                    r.unhelpful_count,
                    r.brand_response,
                    format_timestamp(r.brand_response_date),
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn load(&self) -> StorageResult<(Vec<ProductRecord>, Vec<ReviewRecord>)> {
        let mut stmt = self.conn.prepare(
            "SELECT name, model, sku_model, price, savings, comp_value FROM products ORDER BY id",
        )?;
        let products = stmt
            .query_map([], |row| {
                Ok(ProductRecord {
                    name: row.get(0)?,
                    model: row.get(1)?,
                    sku_model: row.get(2)?,
                    price: row.get(3)?,
                    savings: row.get(4)?,
                    comp_value: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT product_name, product_model, review_index, author, rating, review_title,
             verified_purchase, submission_date, ownership_duration, promo_consideration,
             review_text, image_count, recommendation, helpful_count, unhelpful_count,
             brand_response, brand_response_date
             FROM reviews ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                let submission: Option<String> = row.get(7)?;
                let response: Option<String> = row.get(16)?;
                Ok((
                    ReviewRecord {
                        product_name: row.get(0)?,
                        product_model: row.get(1)?,
                        review_index: row.get(2)?,
                        author: row.get(3)?,
                        rating: row.get(4)?,
                        title: row.get(5)?,
                        verified_purchase: row.get(6)?,
                        submission_date: None,
                        ownership_duration: row.get(8)?,
                        promo_consideration: row.get(9)?,
                        body: row.get(10)?,
                        image_count: row.get(11)?,
                        recommendation: row.get(12)?,
                        helpful_count: row.get(13)?,
                        unhelpful_count: row.get(14)?,
                        brand_response: row.get(15)?,
                        brand_response_date: None,
                    },
                    submission,
                    response,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut reviews = Vec::with_capacity(rows.len());
        for (mut review, submission, response) in rows {
            review.submission_date = parse_stored("submission_date", submission)?;
            review.brand_response_date = parse_stored("brand_response_date", response)?;
            reviews.push(review);
        }

        Ok((products, reviews))
    }

    fn location(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => ":memory:".to_string(),
        }
    }
}

fn format_timestamp(value: Option<NaiveDateTime>) -> Option<String> {
    value.map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
}

fn parse_stored(column: &str, value: Option<String>) -> StorageResult<Option<NaiveDateTime>> {
    match value {
        None => Ok(None),
        Some(text) => NaiveDateTime::parse_from_str(&text, TIMESTAMP_FORMAT)
            .map(Some)
            .map_err(|_| StorageError::Malformed {
                column: column.to_string(),
                value: text,
            }),
    }
}
