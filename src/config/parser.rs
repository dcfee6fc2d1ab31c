use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use review_harvest::config::load_config;
///
/// let config = load_config(Path::new("harvest.toml")).unwrap();
/// println!("Skip threshold: {}", config.crawler.skip_threshold);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at the start of each run so two partial runs can be matched up
/// before their output files are merged.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_minimal_config_uses_defaults() {
        let config_content = r#"
[crawler]
start-url = "https://shop.example.com/phones?cp=1"

[output]
products-path = "./products.csv"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.skip_threshold, 0);
        assert_eq!(config.crawler.page_delay_ms, 2000);
        assert_eq!(config.crawler.wait_timeout_ms, 10_000);
        assert_eq!(config.crawler.max_list_pages, None);
        assert_eq!(config.output.format, OutputFormat::Csv);
        assert_eq!(config.output.reviews_path, "reviews_skipped{skip}.csv");
        assert_eq!(config.selectors.review.item, ".review-item");
        assert!(!config.browser.https_only);
    }

    #[test]
    fn test_load_full_config() {
        let config_content = r#"
[crawler]
start-url = "https://shop.example.com/phones?cp=1"
skip-threshold = 160
max-list-pages = 18
max-review-pages = 40
page-delay-ms = 0
wait-timeout-ms = 500
field-timeout-ms = 100

[browser]
user-agent = "TestHarvester/1.0"
https-only = true
entry-click = "a.us-link"

[selectors.review]
list = "ol.reviews"

[output]
format = "sqlite"
database-path = "./harvest_{skip}.db"
snapshot-dir = "./snapshots"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.skip_threshold, 160);
        assert_eq!(config.crawler.max_list_pages, Some(18));
        assert_eq!(config.browser.entry_click.as_deref(), Some("a.us-link"));
        assert_eq!(config.selectors.review.list, "ol.reviews");
        // untouched selectors keep their defaults
        assert_eq!(config.selectors.review.item, ".review-item");
        assert_eq!(config.output.format, OutputFormat::Sqlite);
        assert_eq!(config.output.database_path_for(160), "./harvest_160.db");
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/harvest.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[crawler]
start-url = "https://shop.example.com/"
wait-timeout-ms = 0

[output]
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
