use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use pdf_scraper::url::extract_domain;
///
/// let url = Url::parse("https://GO.dev/blog/").unwrap();
/// assert_eq!(extract_domain(&url), Some("go.dev".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns `host` or `host:port` when the URL carries an explicit port
///
/// Root-relative links are rebuilt from this authority so that crawls of
/// servers on non-default ports keep their port.
pub fn authority(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_subdomain() {
        let url = Url::parse("https://blog.example.com/post").unwrap();
        assert_eq!(extract_domain(&url), Some("blog.example.com".to_string()));
    }

    #[test]
    fn test_extract_ignores_port() {
        let url = Url::parse("http://127.0.0.1:8080/").unwrap();
        assert_eq!(extract_domain(&url), Some("127.0.0.1".to_string()));
    }

    #[test]
    fn test_authority_keeps_explicit_port() {
        let url = Url::parse("http://127.0.0.1:8080/docs").unwrap();
        assert_eq!(authority(&url), Some("127.0.0.1:8080".to_string()));
    }

    #[test]
    fn test_authority_drops_default_port() {
        let url = Url::parse("https://example.com:443/docs").unwrap();
        assert_eq!(authority(&url), Some("example.com".to_string()));
    }
}
