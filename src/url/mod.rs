//! URL handling module for pdf-scraper
//!
//! This module validates the crawl origin and filters the links discovered
//! on each page down to same-host URLs.

mod domain;
mod filter;

use crate::{UrlError, UrlResult};
use url::Url;

// Re-export main functions
pub use domain::{authority, extract_domain};
pub use filter::{is_same_host, resolve_link};

/// Parses and validates the crawl origin
///
/// The origin must be an absolute `http` or `https` URL with a host.
///
/// # Examples
///
/// ```
/// use pdf_scraper::url::parse_origin;
///
/// assert!(parse_origin("https://go.dev/blog/").is_ok());
/// assert!(parse_origin("go.dev/blog").is_err());
/// assert!(parse_origin("file:///etc/passwd").is_err());
/// ```
pub fn parse_origin(raw: &str) -> UrlResult<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    Ok(url)
}
