//! Product and review records, and the builder that fills them in
//!
//! Column order in the output tables follows struct field order.

use super::field::{ExtractionStats, FieldExtractor, Read, Scope};
use super::parse::{
    mentions_promo, parse_ownership, parse_parenthesized_count, parse_rating, parse_timestamp,
};
use crate::browser::{BrowsingContext, ElementHandle};
use crate::config::{ProductSelectors, ReviewSelectors, SelectorConfig};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Product identity and pricing, read from the product tab
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductRecord {
    pub name: Option<String>,
    pub model: Option<String>,
    pub sku_model: Option<String>,
    pub price: Option<String>,
    pub savings: Option<String>,
    pub comp_value: Option<String>,
}

/// One review, stamped with the product it belongs to
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub product_name: Option<String>,
    pub product_model: Option<String>,
    /// 1-based position across every review page of the product
    pub review_index: u32,
    pub author: Option<String>,
    pub rating: Option<u8>,
    #[serde(rename = "review_title")]
    pub title: Option<String>,
    pub verified_purchase: bool,
    pub submission_date: Option<NaiveDateTime>,
    pub ownership_duration: Option<String>,
    pub promo_consideration: bool,
    #[serde(rename = "review_text")]
    pub body: Option<String>,
    pub image_count: u32,
    pub recommendation: bool,
    pub helpful_count: u32,
    pub unhelpful_count: u32,
    pub brand_response: Option<String>,
    pub brand_response_date: Option<NaiveDateTime>,
}

impl ProductRecord {
    /// Output column names, in field order
    pub const COLUMNS: &'static [&'static str] =
        &["name", "model", "sku_model", "price", "savings", "comp_value"];
}

impl ReviewRecord {
    /// Output column names, in field order
    pub const COLUMNS: &'static [&'static str] = &[
        "product_name",
        "product_model",
        "review_index",
        "author",
        "rating",
        "review_title",
        "verified_purchase",
        "submission_date",
        "ownership_duration",
        "promo_consideration",
        "review_text",
        "image_count",
        "recommendation",
        "helpful_count",
        "unhelpful_count",
        "brand_response",
        "brand_response_date",
    ];

    /// Copies the product's name and model onto the review
    pub fn with_product(mut self, product: &ProductRecord) -> Self {
        self.product_name = product.name.clone();
        self.product_model = product.model.clone();
        self
    }
}

/// Fills records from the active document, one bounded lookup per field
#[derive(Debug, Clone)]
pub struct RecordBuilder<'a> {
    product: &'a ProductSelectors,
    review: &'a ReviewSelectors,
    field_timeout: Duration,
}

impl<'a> RecordBuilder<'a> {
    pub fn new(selectors: &'a SelectorConfig, field_timeout: Duration) -> Self {
        Self {
            product: &selectors.product,
            review: &selectors.review,
            field_timeout,
        }
    }

    /// Reads the product fields from the active (product) tab
    pub async fn build_product<B: BrowsingContext>(
        &self,
        browser: &B,
        stats: &mut ExtractionStats,
    ) -> ProductRecord {
        let s = self.product;
        let mut fields = FieldExtractor::new(browser, self.field_timeout, stats);

        ProductRecord {
            name: fields.text("product.name", Scope::Page, &s.name).await,
            model: fields.text("product.model", Scope::Page, &s.model).await,
            sku_model: fields.text("product.sku_model", Scope::Page, &s.sku_model).await,
            price: fields.text("product.price", Scope::Page, &s.price).await,
            savings: fields.text("product.savings", Scope::Page, &s.savings).await,
            comp_value: fields.text("product.comp_value", Scope::Page, &s.comp_value).await,
        }
    }

    /// Reads one review item; product fields are left for the caller to stamp
    pub async fn build_review<B: BrowsingContext>(
        &self,
        browser: &B,
        item: &ElementHandle,
        review_index: u32,
        stats: &mut ExtractionStats,
    ) -> ReviewRecord {
        let s = self.review;
        let scope = Scope::Within(item);
        let mut fields = FieldExtractor::new(browser, self.field_timeout, stats);

        ReviewRecord {
            product_name: None,
            product_model: None,
            review_index,
            author: fields.text("review.author", scope, &s.author).await,
            rating: fields
                .extract("review.rating", scope, &s.rating, Read::Text, parse_rating)
                .await,
            title: fields.text("review.title", scope, &s.title).await,
            verified_purchase: fields.exists("review.verified_purchase", scope, &s.verified).await,
            submission_date: fields
                .extract(
                    "review.submission_date",
                    scope,
                    &s.submission_date,
                    Read::Attribute("title"),
                    parse_timestamp,
                )
                .await,
            ownership_duration: fields
                .extract(
                    "review.ownership_duration",
                    scope,
                    &s.posted_block,
                    Read::Text,
                    parse_ownership,
                )
                .await,
            promo_consideration: fields
                .any_text("review.promo_consideration", scope, &s.promo, mentions_promo)
                .await,
            body: fields.text("review.body", scope, &s.body).await,
            image_count: fields.count("review.image_count", scope, &s.images).await,
            recommendation: fields.exists("review.recommendation", scope, &s.recommended).await,
            helpful_count: fields
                .extract_or(
                    "review.helpful_count",
                    scope,
                    &s.helpful,
                    Read::Text,
                    parse_parenthesized_count,
                    0,
                )
                .await,
            unhelpful_count: fields
                .extract_or(
                    "review.unhelpful_count",
                    scope,
                    &s.unhelpful,
                    Read::Text,
                    parse_parenthesized_count,
                    0,
                )
                .await,
            brand_response: fields.text("review.brand_response", scope, &s.brand_response).await,
            brand_response_date: fields
                .extract(
                    "review.brand_response_date",
                    scope,
                    &s.brand_response_date,
                    Read::Attribute("title"),
                    parse_timestamp,
                )
                .await,
        }
    }

    /// Reads `items` in document order, numbering them from `first_index`
    pub async fn build_reviews<B: BrowsingContext>(
        &self,
        browser: &B,
        items: &[ElementHandle],
        first_index: u32,
        stats: &mut ExtractionStats,
    ) -> Vec<ReviewRecord> {
        let mut reviews = Vec::with_capacity(items.len());
        for (offset, item) in items.iter().enumerate() {
            let index = first_index + offset as u32;
            reviews.push(self.build_review(browser, item, index, stats).await);
        }
        reviews
    }
}
