//! HTTP page source
//!
//! This module loads documents over HTTP for the static browsing engine:
//! - Building the HTTP client with the configured user agent and timeouts
//! - GET requests with redirect following
//! - Classifying failures into browser errors

use super::{BrowserError, BrowserResult, FetchedPage, PageSource};
use crate::config::BrowserConfig;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use review_harvest::browser::build_http_client;
/// use review_harvest::config::BrowserConfig;
///
/// let client = build_http_client(&BrowserConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &BrowserConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .https_only(config.https_only)
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`PageSource`] that fetches documents over HTTP
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds the client from browser configuration
    pub fn from_config(config: &BrowserConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config)?))
    }
}

impl PageSource for HttpSource {
    async fn fetch(&self, url: &Url) -> BrowserResult<FetchedPage> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_transport_error(url, e))?;

        let status = response.status();
        let final_url = response.url().clone();

        if !status.is_success() {
            return Err(BrowserError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        // A missing header is treated as HTML
        if !content_type.is_empty() && !content_type.contains("html") {
            return Err(BrowserError::Navigation {
                url: url.to_string(),
                message: format!("expected HTML, got {}", content_type),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify_transport_error(url, e))?;

        tracing::trace!(url = %final_url, bytes = body.len(), "Fetched page");

        Ok(FetchedPage {
            url: final_url,
            body,
        })
    }
}

fn classify_transport_error(url: &Url, error: reqwest::Error) -> BrowserError {
    let message = if error.is_timeout() {
        "request timeout".to_string()
    } else if error.is_connect() {
        "connection refused".to_string()
    } else if error.is_redirect() {
        "too many redirects".to_string()
    } else {
        error.to_string()
    };

    BrowserError::Navigation {
        url: url.to_string(),
        message,
    }
}
