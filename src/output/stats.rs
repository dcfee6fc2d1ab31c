//! Statistics over the persisted tables
//!
//! This module summarizes what a crawl has written so far: row counts of
//! both tables plus review-level aggregates.

use crate::extract::{ProductRecord, ReviewRecord};
use crate::storage::{StorageResult, TableStore};

/// Summary of the persisted product and review tables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableSummary {
    pub product_rows: usize,
    pub review_rows: usize,

    /// Mean of the reviews that carry a rating
    pub average_rating: Option<f64>,

    pub rated_reviews: usize,
    pub verified_purchases: usize,
    pub with_images: usize,
    pub with_brand_response: usize,
    pub recommended: usize,
    pub promo_considerations: usize,
}

impl TableSummary {
    /// Computes the summary from in-memory tables
    pub fn from_records(products: &[ProductRecord], reviews: &[ReviewRecord]) -> Self {
        let ratings: Vec<f64> = reviews
            .iter()
            .filter_map(|r| r.rating)
            .map(f64::from)
            .collect();
        let average_rating =
            (!ratings.is_empty()).then(|| ratings.iter().sum::<f64>() / ratings.len() as f64);

        Self {
            product_rows: products.len(),
            review_rows: reviews.len(),
            average_rating,
            rated_reviews: ratings.len(),
            verified_purchases: reviews.iter().filter(|r| r.verified_purchase).count(),
            with_images: reviews.iter().filter(|r| r.image_count > 0).count(),
            with_brand_response: reviews.iter().filter(|r| r.brand_response.is_some()).count(),
            recommended: reviews.iter().filter(|r| r.recommendation).count(),
            promo_considerations: reviews.iter().filter(|r| r.promo_consideration).count(),
        }
    }
}

/// Loads both tables from `store` and summarizes them
///
/// # Arguments
///
/// * `store` - The table backend to read
pub fn load_summary<S: TableStore>(store: &S) -> StorageResult<TableSummary> {
    let (products, reviews) = store.load()?;
    Ok(TableSummary::from_records(&products, &reviews))
}

/// Prints the summary to stdout in a formatted manner
pub fn print_summary(summary: &TableSummary) {
    println!("=== Table Summary ===\n");

    println!("Rows:");
    println!("  Products: {}", summary.product_rows);
    println!("  Reviews: {}", summary.review_rows);
    println!();

    println!("Reviews:");
    match summary.average_rating {
        Some(avg) => println!(
            "  Average rating: {:.2} ({} rated)",
            avg, summary.rated_reviews
        ),
        None => println!("  Average rating: n/a"),
    }
    println!(
        "  Verified purchases: {} ({:.1}%)",
        summary.verified_purchases,
        percentage(summary.verified_purchases, summary.review_rows)
    );
    println!("  With images: {}", summary.with_images);
    println!("  With brand response: {}", summary.with_brand_response);
    println!("  Recommended: {}", summary.recommended);
    println!("  Promo considerations: {}", summary.promo_considerations);
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}
