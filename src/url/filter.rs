use crate::url::domain::{authority, extract_domain};
use url::Url;

/// Resolves a raw `href` found on a page into a crawlable URL string
///
/// Only two forms are accepted:
///
/// - root-relative paths (`/blog/post`), rebuilt on the origin's scheme and host
/// - absolute `http(s)` URLs whose hostname equals the origin's hostname
///
/// Everything else (`mailto:`, `javascript:`, `#fragment`, `//host/path`,
/// document-relative paths) is rejected. Accepted strings are returned as-is:
/// trailing slashes, query strings, fragments and case are not normalized, so
/// `/a` and `/a/` count as two different pages.
///
/// # Examples
///
/// ```
/// use pdf_scraper::url::{parse_origin, resolve_link};
///
/// let origin = parse_origin("https://example.com/docs").unwrap();
/// assert_eq!(
///     resolve_link("/docs/intro", &origin),
///     Some("https://example.com/docs/intro".to_string())
/// );
/// assert_eq!(resolve_link("https://other.org/", &origin), None);
/// ```
pub fn resolve_link(raw: &str, origin: &Url) -> Option<String> {
    let link = raw.trim();

    if link.starts_with("//") {
        return None;
    }

    if link.starts_with('/') {
        let authority = authority(origin)?;
        return Some(format!("{}://{}{}", origin.scheme(), authority, link));
    }

    if link.starts_with("http") {
        let parsed = Url::parse(link).ok()?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return None;
        }
        if is_same_host(&parsed, origin) {
            return Some(link.to_string());
        }
    }

    None
}

/// Returns true when both URLs share the same hostname (ports ignored)
pub fn is_same_host(url: &Url, origin: &Url) -> bool {
    match (extract_domain(url), extract_domain(origin)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
