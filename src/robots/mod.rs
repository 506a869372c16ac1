//! Robots.txt handling module
//!
//! Robots.txt is only consulted when `respect-robots-txt` is enabled. The
//! crawl is single-host, so the file is fetched once per run.

mod parser;

pub use parser::ParsedRobots;

use reqwest::{Client, StatusCode};
use url::Url;

/// Fetches robots.txt for the origin host
///
/// A missing file (4xx) means everything is allowed, as does a network
/// failure; the failure is logged rather than aborting the crawl.
pub async fn fetch_robots(client: &Client, origin: &Url) -> ParsedRobots {
    let mut robots_url = origin.clone();
    robots_url.set_path("/robots.txt");
    robots_url.set_query(None);
    robots_url.set_fragment(None);

    tracing::debug!("Fetching {}", robots_url);

    let response = match client.get(robots_url.as_str()).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Could not fetch {}: {}; allowing all", robots_url, e);
            return ParsedRobots::allow_all();
        }
    };

    let status = response.status();
    if status.is_client_error() || status == StatusCode::NO_CONTENT {
        tracing::debug!("No robots.txt at {} (HTTP {})", robots_url, status);
        return ParsedRobots::allow_all();
    }

    if !status.is_success() {
        tracing::warn!("robots.txt returned HTTP {}; allowing all", status);
        return ParsedRobots::allow_all();
    }

    match response.text().await {
        Ok(body) => ParsedRobots::from_content(&body),
        Err(e) => {
            tracing::warn!("Could not read {}: {}; allowing all", robots_url, e);
            ParsedRobots::allow_all()
        }
    }
}
