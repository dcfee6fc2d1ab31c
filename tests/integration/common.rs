//! Shared fixtures: a tiny catalog site rendered as HTML strings

use review_harvest::config::{parse_config, Config};

pub const BASE: &str = "https://shop.test";

/// One listing page; `next` is an href, `Some("disabled")` or `None`
pub fn listing_page(items: &[u32], next: Option<&str>) -> String {
    let items: String = items
        .iter()
        .map(|id| {
            format!(
                r#"<div class="sku-item" id="shop-sku-list-item-{id}"><h4><a href="/p/{id}">Product {id}</a></h4></div>"#
            )
        })
        .collect();
    let pager = match next {
        Some("disabled") => {
            r##"<a class="sku-list-page-next disabled" href="#">Next</a>"##.to_string()
        }
        Some(href) => format!(r#"<a class="sku-list-page-next" href="{}">Next</a>"#, href),
        None => String::new(),
    };
    format!(
        r#"<html><body><ol class="sku-item-list">{}</ol><div class="footer-pagination">{}</div></body></html>"#,
        items, pager
    )
}

/// Product page linking to `/r/{id}`
pub fn product_page(id: u32) -> String {
    format!(
        r#"<html><body><h1>Product {id}</h1>
        <a href="/r/{id}">See All Customer Reviews (12)</a></body></html>"#
    )
}

/// Product page without a reviews link
pub fn product_page_without_reviews(id: u32) -> String {
    format!(r#"<html><body><h1>Product {id}</h1><p>Be the first to write a review</p></body></html>"#)
}

/// Review page carrying the product header and one item per rating
pub fn review_page(id: u32, ratings: &[u8], next: Option<&str>) -> String {
    let items: String = ratings
        .iter()
        .map(|r| {
            format!(
                r#"<li class="review-item">
                  <div class="ugc-author"><strong>user{r}</strong></div>
                  <p class="visually-hidden">Rated {r} out of 5 stars</p>
                  <h4 class="review-title">Title {r}</h4>
                  <div class="ugc-review-body"><p>Body {r}</p></div>
                  <button class="helpfulness-button">Helpful ({r})</button>
                </li>"#
            )
        })
        .collect();
    let pager = match next {
        Some("disabled") => {
            r##"<li class="page next disabled"><a href="#">Next</a></li>"##.to_string()
        }
        Some(href) => format!(r#"<li class="page next"><a href="{}">Next</a></li>"#, href),
        None => String::new(),
    };
    format!(
        r#"<html><body>
        <div class="product-info-container">
          <h2 class="product-title"><a href="/p/{id}">Product {id}</a></h2>
          <dl class="model-and-sku"><dt>Model</dt><dd>M-{id}</dd><dt>SKU</dt><dd>{id}00</dd></dl>
        </div>
        <ul class="reviews-list">{items}</ul>
        <ul class="pagination">{pager}</ul>
        </body></html>"#
    )
}

/// Fast test configuration; `extra` is appended to the `[crawler]` table
pub fn test_config(start_url: &str, extra: &str, output: &str) -> Config {
    parse_config(&format!(
        r#"
[crawler]
start-url = "{start_url}"
page-delay-ms = 0
wait-timeout-ms = 50
field-timeout-ms = 10
{extra}

[output]
{output}
"#
    ))
    .expect("test config should be valid")
}

pub fn url(path: &str) -> String {
    format!("{}{}", BASE, path)
}
