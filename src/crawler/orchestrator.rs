//! Top-level crawl driver
//!
//! Owns the browsing engine and the record accumulator. However the crawl
//! ends (listing exhausted, fatal error, shutdown request) the session is
//! unwound to the main window and the engine is torn down exactly once.

use super::list::ListPaginator;
use super::throttle;
use crate::browser::{BrowserError, BrowsingContext, HttpSource, SessionStack, StaticBrowser};
use crate::config::Config;
use crate::output::{CrawlReport, StopReason};
use crate::storage::{open_store, RecordAccumulator, TableStore};
use crate::{HarvestError, Result};
use std::future::Future;
use std::time::{Duration, Instant};

/// Composes the listing traversal, the accumulator and engine teardown
pub struct CrawlOrchestrator<B, S> {
    config: Config,
    browser: B,
    accumulator: RecordAccumulator<S>,
    skip_threshold: u64,
    torn_down: bool,
}

impl<B: BrowsingContext, S: TableStore> CrawlOrchestrator<B, S> {
    /// Creates an orchestrator using the configured skip threshold
    pub fn new(config: Config, browser: B, store: S) -> Self {
        let skip_threshold = config.crawler.skip_threshold;
        Self {
            config,
            browser,
            accumulator: RecordAccumulator::new(store),
            skip_threshold,
            torn_down: false,
        }
    }

    /// Overrides the skip threshold read from the configuration
    pub fn with_skip_threshold(mut self, skip_threshold: u64) -> Self {
        self.skip_threshold = skip_threshold;
        self
    }

    pub fn accumulator(&self) -> &RecordAccumulator<S> {
        &self.accumulator
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    /// Runs the crawl to completion
    pub async fn run(&mut self) -> Result<CrawlReport> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Runs the crawl until it completes or `shutdown` resolves
    ///
    /// Items flushed before the shutdown stay on disk. The engine is torn
    /// down before returning on every path; a second call fails with
    /// [`HarvestError::Teardown`].
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<CrawlReport>
    where
        F: Future<Output = ()>,
    {
        if self.torn_down {
            return Err(HarvestError::Teardown(
                "browser was already shut down".to_string(),
            ));
        }

        let started = Instant::now();
        let mut report = CrawlReport::new();
        let mut session = None;

        let outcome = tokio::select! {
            biased;
            _ = shutdown => None,
            result = self.crawl(&mut session, &mut report) => Some(result),
        };

        let result = match outcome {
            Some(result) => result,
            None => {
                tracing::warn!("Shutdown requested, stopping crawl");
                report.stop = Some(StopReason::Interrupted);
                Ok(())
            }
        };
        report.elapsed = started.elapsed();

        let teardown = self.teardown(session).await;
        result?;
        teardown?;

        tracing::info!(
            items = report.items_extracted,
            reviews = report.reviews_extracted,
            elapsed_secs = report.elapsed.as_secs(),
            "Crawl finished"
        );
        Ok(report)
    }

    async fn crawl(
        &mut self,
        session: &mut Option<SessionStack>,
        report: &mut CrawlReport,
    ) -> Result<()> {
        let start_url = self.config.crawler.start_url.clone();
        tracing::info!(url = %start_url, skip = self.skip_threshold, "Starting crawl");

        if let Err(e) = self.browser.navigate(&start_url).await {
            if e.is_fatal() {
                return Err(e.into());
            }
            tracing::error!("Failed to load start page: {}", e);
            report.stop = Some(StopReason::StartFailed(e.to_string()));
            return Ok(());
        }

        let main = self.browser.active_tab().ok_or(BrowserError::NoActiveTab)?;
        let session = session.insert(SessionStack::new(main));

        self.entry_click().await;

        let mut paginator = ListPaginator::new(&self.config, self.skip_threshold);
        paginator
            .run(&mut self.browser, session, &mut self.accumulator, report)
            .await
    }

    /// Clicks the configured entry element once; failures are only logged
    async fn entry_click(&mut self) {
        let Some(selector) = self.config.browser.entry_click.clone() else {
            return;
        };
        let timeout = Duration::from_millis(self.config.crawler.wait_timeout_ms);

        let clicked = match self.browser.wait_for(&selector, timeout).await {
            Ok(element) => self.browser.click(&element).await,
            Err(e) => Err(e),
        };

        match clicked {
            Ok(()) => {
                tracing::info!(selector = %selector, "Clicked entry element");
                throttle(Duration::from_millis(self.config.crawler.page_delay_ms)).await;
            }
            Err(e) => tracing::warn!(selector = %selector, "Entry click failed: {}", e),
        }
    }

    async fn teardown(&mut self, session: Option<SessionStack>) -> Result<()> {
        if let Some(mut session) = session {
            if let Err(e) = session.unwind_to(&mut self.browser, 1).await {
                tracing::warn!("Failed to unwind tabs before shutdown: {}", e);
            }
        }

        self.torn_down = true;
        self.browser
            .quit()
            .await
            .map_err(|e| HarvestError::Teardown(e.to_string()))?;
        tracing::debug!("Browser shut down");
        Ok(())
    }
}

/// Runs a complete crawl over HTTP, stopping early on Ctrl-C
///
/// Builds the HTTP page source, the static browsing engine and the
/// configured table store, then drives the crawl.
///
/// # Arguments
///
/// * `config` - The validated configuration
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The crawl ran to a stop (including an interrupt)
/// * `Err(HarvestError)` - A fatal error ended the crawl
pub async fn run_crawl(config: Config) -> Result<CrawlReport> {
    run_crawl_until(config, ctrl_c()).await
}

/// [`run_crawl`] with a caller-provided shutdown signal
pub async fn run_crawl_until<F>(config: Config, shutdown: F) -> Result<CrawlReport>
where
    F: Future<Output = ()>,
{
    let source = HttpSource::from_config(&config.browser)?;
    let load_timeout = Duration::from_secs(config.browser.request_timeout_secs + 5);
    let browser = StaticBrowser::new(source).with_load_timeout(load_timeout);

    let store = open_store(&config.output, config.crawler.skip_threshold)?;
    tracing::info!(location = %store.location(), "Writing tables");

    let mut orchestrator = CrawlOrchestrator::new(config, browser, store);
    orchestrator.run_until(shutdown).await
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
