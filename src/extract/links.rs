//! Link discovery
//!
//! Collects the outgoing links of a page that the crawler may follow.

use crate::url::resolve_link;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Returns the crawlable links of a document in document order
///
/// Every `a[href]` is passed through [`resolve_link`]; rejected links are
/// dropped and repeats within the same page are removed. Whether a link has
/// been seen on another page is not decided here.
///
/// # Example
///
/// ```
/// use pdf_scraper::extract::discover_links;
/// use pdf_scraper::url::parse_origin;
/// use scraper::Html;
///
/// let origin = parse_origin("https://example.com/docs").unwrap();
/// let doc = Html::parse_document(
///     r#"<a href="/a">A</a><a href="https://other.com/">X</a><a href="/a">A again</a>"#,
/// );
/// assert_eq!(discover_links(&doc, &origin), vec!["https://example.com/a"]);
/// ```
pub fn discover_links(document: &Html, origin: &Url) -> Vec<String> {
    let Ok(anchors) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&anchors) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        if let Some(link) = resolve_link(href, origin) {
            if seen.insert(link.clone()) {
                links.push(link);
            }
        }
    }

    links
}
