//! Review-Harvest main entry point
//!
//! This is the command-line interface for the Review-Harvest crawler.

use anyhow::Context;
use clap::Parser;
use review_harvest::config::{load_config_with_hash, Config, OutputFormat};
use review_harvest::output::{load_summary, print_report, print_summary};
use review_harvest::run_crawl;
use review_harvest::storage::{open_store, TableStore};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Review-Harvest: a product and review crawler
///
/// Review-Harvest walks a paginated product listing, follows every product
/// to its full review list and writes products and reviews to tables that
/// are rewritten after each product.
#[derive(Parser, Debug)]
#[command(name = "review-harvest")]
#[command(version)]
#[command(about = "A product and review crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Bypass the first N listing items (overrides crawler.skip-threshold)
    #[arg(long, value_name = "N")]
    skip: Option<u64>,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Summarize the existing output tables and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if let Some(skip) = cli.skip {
        config.crawler.skip_threshold = skip;
    }

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("review_harvest=info,warn"),
            1 => EnvFilter::new("review_harvest=debug,info"),
            2 => EnvFilter::new("review_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective settings
fn handle_dry_run(config: &Config) {
    let skip = config.crawler.skip_threshold;

    println!("=== Review-Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Start URL: {}", config.crawler.start_url);
    println!("  Skip threshold: {}", skip);
    match config.crawler.max_list_pages {
        Some(max) => println!("  Max listing pages: {}", max),
        None => println!("  Max listing pages: unlimited"),
    }
    match config.crawler.max_review_pages {
        Some(max) => println!("  Max review pages per product: {}", max),
        None => println!("  Max review pages per product: unlimited"),
    }
    println!("  Page delay: {}ms", config.crawler.page_delay_ms);
    println!("  Wait timeout: {}ms", config.crawler.wait_timeout_ms);
    println!("  Field timeout: {}ms", config.crawler.field_timeout_ms);

    println!("\nBrowser:");
    println!("  User agent: {}", config.browser.user_agent);
    println!("  Request timeout: {}s", config.browser.request_timeout_secs);
    if let Some(entry) = &config.browser.entry_click {
        println!("  Entry click: {}", entry);
    }

    println!("\nSelectors:");
    println!("  Listing item: {}", config.selectors.listing.item);
    println!("  Listing next: {}", config.selectors.listing.next);
    println!("  Review list: {}", config.selectors.review.list);
    println!("  Review item: {}", config.selectors.review.item);

    println!("\nOutput:");
    match config.output.format {
        OutputFormat::Csv => {
            println!("  Products: {}", config.output.products_path_for(skip));
            println!("  Reviews: {}", config.output.reviews_path_for(skip));
        }
        OutputFormat::Sqlite => {
            println!("  Database: {}", config.output.database_path_for(skip));
        }
    }
    if let Some(dir) = &config.output.snapshot_dir {
        println!("  Snapshots: {}", dir);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: summarizes the existing tables
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let store = open_store(&config.output, config.crawler.skip_threshold)
        .context("Failed to open output tables")?;
    println!("Tables: {}\n", store.location());

    let summary = load_summary(&store).context("Failed to read output tables")?;
    print_summary(&summary);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    let output = config.output.clone();
    let skip = config.crawler.skip_threshold;

    let report = match run_crawl(config).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    print_report(&report);

    let store = open_store(&output, skip).context("Failed to reopen output tables")?;
    let summary = load_summary(&store).context("Failed to read output tables")?;
    print_summary(&summary);

    Ok(())
}
