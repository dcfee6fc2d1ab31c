//! Database schema definitions
//!
//! This module contains the SQL schema for the SQLite table backend.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per extracted product, in crawl order
CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT,
    model TEXT,
    sku_model TEXT,
    price TEXT,
    savings TEXT,
    comp_value TEXT
);

-- One row per review; product_name + product_model join to products
CREATE TABLE IF NOT EXISTS reviews (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    product_name TEXT,
    product_model TEXT,
    review_index INTEGER NOT NULL,
    author TEXT,
    rating INTEGER,
    review_title TEXT,
    verified_purchase INTEGER NOT NULL DEFAULT 0,
    submission_date TEXT,
    ownership_duration TEXT,
    promo_consideration INTEGER NOT NULL DEFAULT 0,
    review_text TEXT,
    image_count INTEGER NOT NULL DEFAULT 0,
    recommendation INTEGER NOT NULL DEFAULT 0,
    helpful_count INTEGER NOT NULL DEFAULT 0,
    unhelpful_count INTEGER NOT NULL DEFAULT 0,
    brand_response TEXT,
    brand_response_date TEXT
);

CREATE INDEX IF NOT EXISTS idx_reviews_product ON reviews(product_name, product_model);
"#;

/// Initializes the database schema
///
/// Creates all tables and indexes if they don't exist.
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
