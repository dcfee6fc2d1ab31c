use crate::config::types::{
    BrowserConfig, Config, CrawlerConfig, ListingSelectors, OutputConfig, OutputFormat,
    ProductSelectors, ReviewSelectors, SelectorConfig,
};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_browser_config(&config.browser)?;
    validate_selectors(&config.selectors)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.start_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid start_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "start_url '{}' must use http or https",
            config.start_url
        )));
    }

    if config.wait_timeout_ms < 1 {
        return Err(ConfigError::Validation(format!(
            "wait_timeout_ms must be >= 1ms, got {}ms",
            config.wait_timeout_ms
        )));
    }

    if config.field_timeout_ms < 1 {
        return Err(ConfigError::Validation(format!(
            "field_timeout_ms must be >= 1ms, got {}ms",
            config.field_timeout_ms
        )));
    }

    if config.max_list_pages == Some(0) {
        return Err(ConfigError::Validation(
            "max_list_pages must be >= 1 when set".to_string(),
        ));
    }

    if config.max_review_pages == Some(0) {
        return Err(ConfigError::Validation(
            "max_review_pages must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates browser configuration
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if let Some(entry_click) = &config.entry_click {
        validate_selector("browser.entry-click", entry_click)?;
    }

    Ok(())
}

/// Validates that every configured locator parses as CSS
fn validate_selectors(config: &SelectorConfig) -> Result<(), ConfigError> {
    let ListingSelectors {
        item,
        item_link,
        next,
        reviews_link,
        reviews_link_text: _,
    } = &config.listing;
    validate_selector("selectors.listing.item", item)?;
    validate_selector("selectors.listing.item-link", item_link)?;
    validate_selector("selectors.listing.next", next)?;
    validate_selector("selectors.listing.reviews-link", reviews_link)?;

    let ProductSelectors {
        name,
        model,
        sku_model,
        price,
        savings,
        comp_value,
    } = &config.product;
    for (field, selector) in [
        ("selectors.product.name", name),
        ("selectors.product.model", model),
        ("selectors.product.sku-model", sku_model),
        ("selectors.product.price", price),
        ("selectors.product.savings", savings),
        ("selectors.product.comp-value", comp_value),
    ] {
        validate_selector(field, selector)?;
    }

    let review: &ReviewSelectors = &config.review;
    for (field, selector) in [
        ("selectors.review.list", &review.list),
        ("selectors.review.item", &review.item),
        ("selectors.review.next", &review.next),
        ("selectors.review.next-link", &review.next_link),
        ("selectors.review.author", &review.author),
        ("selectors.review.rating", &review.rating),
        ("selectors.review.title", &review.title),
        ("selectors.review.verified", &review.verified),
        ("selectors.review.submission-date", &review.submission_date),
        ("selectors.review.posted-block", &review.posted_block),
        ("selectors.review.promo", &review.promo),
        ("selectors.review.body", &review.body),
        ("selectors.review.images", &review.images),
        ("selectors.review.recommended", &review.recommended),
        ("selectors.review.helpful", &review.helpful),
        ("selectors.review.unhelpful", &review.unhelpful),
        ("selectors.review.brand-response", &review.brand_response),
        ("selectors.review.brand-response-date", &review.brand_response_date),
    ] {
        validate_selector(field, selector)?;
    }

    Ok(())
}

/// Validates a single CSS selector
fn validate_selector(field: &str, selector: &str) -> Result<(), ConfigError> {
    if selector.trim().is_empty() || Selector::parse(selector).is_err() {
        return Err(ConfigError::InvalidSelector {
            field: field.to_string(),
            selector: selector.to_string(),
        });
    }
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    match config.format {
        OutputFormat::Csv => {
            if config.products_path.is_empty() {
                return Err(ConfigError::Validation(
                    "products_path cannot be empty".to_string(),
                ));
            }

            if config.reviews_path.is_empty() {
                return Err(ConfigError::Validation(
                    "reviews_path cannot be empty".to_string(),
                ));
            }

            if config.products_path == config.reviews_path {
                return Err(ConfigError::Validation(
                    "products_path and reviews_path must differ".to_string(),
                ));
            }
        }
        OutputFormat::Sqlite => {
            if config.database_path.is_empty() {
                return Err(ConfigError::Validation(
                    "database_path cannot be empty".to_string(),
                ));
            }
        }
    }

    if matches!(&config.snapshot_dir, Some(dir) if dir.is_empty()) {
        return Err(ConfigError::Validation(
            "snapshot_dir cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}
