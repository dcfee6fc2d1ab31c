use serde::Deserialize;

/// Main configuration structure for Review-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    pub output: OutputConfig,
}

/// Crawl traversal configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// First listing page of the catalog
    pub start_url: String,

    /// Number of leading listing items to bypass (resume support)
    #[serde(default)]
    pub skip_threshold: u64,

    /// Stop after this many listing pages even if "next" is still enabled
    #[serde(default)]
    pub max_list_pages: Option<u32>,

    /// Stop after this many review pages per product
    #[serde(default)]
    pub max_review_pages: Option<u32>,

    /// Throttle after every page transition (milliseconds)
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    /// Bound for container waits (listing, review list) in milliseconds
    #[serde(default = "default_wait_timeout_ms")]
    pub wait_timeout_ms: u64,

    /// Bound for a single field lookup in milliseconds
    #[serde(default = "default_field_timeout_ms")]
    pub field_timeout_ms: u64,
}

fn default_page_delay_ms() -> u64 {
    2000
}

fn default_wait_timeout_ms() -> u64 {
    10_000
}

fn default_field_timeout_ms() -> u64 {
    2000
}

/// Browsing engine configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BrowserConfig {
    /// User-Agent header sent with every page load
    pub user_agent: String,

    /// Whole-request timeout for one page load (seconds)
    pub request_timeout_secs: u64,

    /// Refuse plain-HTTP page loads
    pub https_only: bool,

    /// Element clicked once on the start page before scanning
    pub entry_click: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("review-harvest/{}", env!("CARGO_PKG_VERSION")),
            request_timeout_secs: 30,
            https_only: false,
            entry_click: None,
        }
    }
}

/// All CSS locators, grouped by the page they apply to
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub listing: ListingSelectors,
    pub product: ProductSelectors,
    pub review: ReviewSelectors,
}

/// Locators on the outer catalog listing
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ListingSelectors {
    /// One element per listed item
    pub item: String,

    /// The item's primary link, looked up inside the item element
    pub item_link: String,

    /// The listing's "next page" control
    pub next: String,

    /// Element on the product page linking to the full review list
    pub reviews_link: String,

    /// Text the reviews link must contain
    pub reviews_link_text: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            item: "[id*='shop-sku-list-item']".to_string(),
            item_link: "a".to_string(),
            next: ".footer-pagination .sku-list-page-next".to_string(),
            reviews_link: "a".to_string(),
            reviews_link_text: "See All Customer Reviews".to_string(),
        }
    }
}

/// Locators for the product fields, read from the reviews page
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ProductSelectors {
    pub name: String,
    pub model: String,
    pub sku_model: String,
    pub price: String,
    pub savings: String,
    pub comp_value: String,
}

impl Default for ProductSelectors {
    fn default() -> Self {
        Self {
            name: ".product-info-container h2.product-title a".to_string(),
            model: ".product-info-container dl.model-and-sku dd:nth-of-type(1)".to_string(),
            sku_model: ".product-info-container dl.model-and-sku dd:nth-of-type(3)".to_string(),
            price: "div[data-testid='customer-price'] span[aria-hidden='true']".to_string(),
            savings: "div[data-testid='savings']".to_string(),
            comp_value: "div[data-testid='regular-price'] span[aria-hidden='true']".to_string(),
        }
    }
}

/// Locators on the review list and inside one review item
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ReviewSelectors {
    pub list: String,
    pub item: String,
    pub next: String,
    pub next_link: String,
    pub author: String,
    pub rating: String,
    pub title: String,
    pub verified: String,
    pub submission_date: String,
    pub posted_block: String,
    pub promo: String,
    pub body: String,
    pub images: String,
    pub recommended: String,
    pub helpful: String,
    pub unhelpful: String,
    pub brand_response: String,
    pub brand_response_date: String,
}

impl Default for ReviewSelectors {
    fn default() -> Self {
        Self {
            list: ".reviews-list".to_string(),
            item: ".review-item".to_string(),
            next: "li.page.next".to_string(),
            next_link: "a".to_string(),
            author: "div.ugc-author strong".to_string(),
            rating: "p.visually-hidden".to_string(),
            title: "h4.review-title".to_string(),
            verified: "div.verified-purchaser-sv-wrapper".to_string(),
            submission_date: "div.posted-date-ownership time.submission-date".to_string(),
            posted_block: "div.posted-date-ownership".to_string(),
            promo: "div.body-copy-sm".to_string(),
            body: "div.ugc-review-body p".to_string(),
            images: "ul.gallery-preview li".to_string(),
            recommended: "svg.is-recommended-icon".to_string(),
            helpful: "button.helpfulness-button".to_string(),
            unhelpful: "button.neg-feedback".to_string(),
            brand_response: "div.ugc-brand-response div.ugc-brand-response-body p".to_string(),
            brand_response_date: "div.ugc-brand-response time.submission-date".to_string(),
        }
    }
}

/// Persisted output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Sqlite,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Product table path; `{skip}` expands to the skip threshold
    #[serde(default = "default_products_path")]
    pub products_path: String,

    /// Review table path; `{skip}` expands to the skip threshold
    #[serde(default = "default_reviews_path")]
    pub reviews_path: String,

    /// SQLite database path (sqlite format only)
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Where to drop page snapshots when an item fails
    #[serde(default)]
    pub snapshot_dir: Option<String>,
}

fn default_products_path() -> String {
    "products_skipped{skip}.csv".to_string()
}

fn default_reviews_path() -> String {
    "reviews_skipped{skip}.csv".to_string()
}

fn default_database_path() -> String {
    "harvest.db".to_string()
}

impl OutputConfig {
    /// Product table path with the skip placeholder expanded
    pub fn products_path_for(&self, skip: u64) -> String {
        expand_skip(&self.products_path, skip)
    }

    /// Review table path with the skip placeholder expanded
    pub fn reviews_path_for(&self, skip: u64) -> String {
        expand_skip(&self.reviews_path, skip)
    }

    /// Database path with the skip placeholder expanded
    pub fn database_path_for(&self, skip: u64) -> String {
        expand_skip(&self.database_path, skip)
    }
}

fn expand_skip(template: &str, skip: u64) -> String {
    template.replace("{skip}", &skip.to_string())
}
