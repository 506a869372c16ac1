//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler:
//! - Building the HTTP client (user agent, per-request timeout, redirects)
//! - GET requests for page content
//! - Classifying failures so a single bad URL never aborts the crawl
//!
//! There are no retries: a failed fetch abandons its URL for the rest of the run.

use crate::config::Config;
use crate::ScraperError;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client};
use std::time::Duration;

/// Maximum number of redirects followed for a single request
const MAX_REDIRECTS: usize = 10;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched an HTML page
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Page body content
        body: String,
    },

    /// Response was not HTML
    ContentMismatch {
        /// The Content-Type received
        content_type: String,
    },

    /// Non-success HTTP status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// The request exceeded the per-request timeout
    Timeout,

    /// Connection, DNS, TLS, or body read failure
    NetworkError {
        /// The underlying client error
        error: reqwest::Error,
    },
}

impl FetchResult {
    /// Converts the result into the fetched page or a per-URL error
    pub fn into_page(self, url: &str) -> Result<FetchedPage, ScraperError> {
        match self {
            Self::Success {
                final_url,
                status_code,
                body,
            } => Ok(FetchedPage {
                final_url,
                status_code,
                body,
            }),
            Self::ContentMismatch { content_type } => Err(ScraperError::ContentMismatch {
                url: url.to_string(),
                content_type,
            }),
            Self::HttpError { status_code } => Err(ScraperError::Status {
                url: url.to_string(),
                status: status_code,
            }),
            Self::Timeout => Err(ScraperError::Timeout {
                url: url.to_string(),
            }),
            Self::NetworkError { error } => Err(ScraperError::Http {
                url: url.to_string(),
                source: error,
            }),
        }
    }
}

/// A successfully fetched HTML page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub final_url: String,
    pub status_code: u16,
    pub body: String,
}

/// Builds an HTTP client with proper configuration
///
/// The client carries the per-request timeout, which is independent of the
/// crawl-wide deadline.
///
/// # Example
///
/// ```no_run
/// use pdf_scraper::config::Config;
/// use pdf_scraper::crawler::build_http_client;
///
/// let client = build_http_client(&Config::default()).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    let request_timeout = Duration::from_secs(config.crawler.request_timeout_secs);

    Client::builder()
        .user_agent(config.user_agent.header_value())
        .timeout(request_timeout)
        .connect_timeout(request_timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and classifies the outcome
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx with an HTML (or missing) Content-Type | `Success` |
/// | 2xx with another Content-Type | `ContentMismatch` |
/// | any other status | `HttpError` |
/// | request timed out | `Timeout` |
/// | connection/DNS/TLS/body failure | `NetworkError` |
pub async fn fetch_url(client: &Client, url: &str) -> FetchResult {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) if e.is_timeout() => return FetchResult::Timeout,
        Err(e) => return FetchResult::NetworkError { error: e },
    };

    let status = response.status();
    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
        };
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !content_type.is_empty() && !content_type.contains("html") {
        return FetchResult::ContentMismatch { content_type };
    }

    let final_url = response.url().to_string();

    match response.text().await {
        Ok(body) => FetchResult::Success {
            final_url,
            status_code: status.as_u16(),
            body,
        },
        Err(e) if e.is_timeout() => FetchResult::Timeout,
        Err(e) => FetchResult::NetworkError { error: e },
    }
}
