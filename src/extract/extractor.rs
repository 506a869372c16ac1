//! Page extractor
//!
//! Turns a parsed HTML document into a [`PageRecord`]. The extractor is a
//! pure function of the document and the selectors; it never touches shared
//! crawl state.

use crate::config::ExtractionConfig;
use crate::extract::record::{PageRecord, PageRecordBuilder};
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};

/// Title used when no heading can be found
pub const UNTITLED: &str = "Untitled";

/// Elements walked, in document order, to build the content segments
const CONTENT_BLOCKS: &str = "p, pre, h2, h3, ul, ol";

/// Compiled selectors used by [`extract`]
#[derive(Debug, Clone)]
pub struct Selectors {
    content: Selector,
    titles: Vec<Selector>,
    blocks: Selector,
}

impl Selectors {
    /// Compiles the selectors from configuration
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, ConfigError> {
        let titles = config
            .title_selectors
            .iter()
            .map(|s| parse_selector(s))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            content: parse_selector(&config.content_selector)?,
            titles,
            blocks: parse_selector(CONTENT_BLOCKS)?,
        })
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector)
        .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {:?}", selector, e)))
}

/// Extracts the article content of a page
///
/// Returns `None` when the document has no element matching the content
/// selector; such pages are not articles and produce no record.
///
/// # Example
///
/// ```
/// use pdf_scraper::config::ExtractionConfig;
/// use pdf_scraper::extract::{extract, Segment, Selectors};
/// use scraper::Html;
///
/// let html = Html::parse_document(
///     "<article><h1>Hello</h1><p>World</p><pre>fn main() {}</pre></article>",
/// );
/// let selectors = Selectors::from_config(&ExtractionConfig::default()).unwrap();
/// let record = extract(&html, "https://example.com/", &selectors).unwrap();
///
/// assert_eq!(record.title(), "Hello");
/// assert_eq!(record.segments()[1], Segment::CodeBlockRef(1));
/// assert_eq!(record.code_block(1), Some("fn main() {}"));
/// ```
pub fn extract(document: &Html, url: &str, selectors: &Selectors) -> Option<PageRecord> {
    let container = document.select(&selectors.content).next()?;

    let title = extract_title(container, &selectors.titles);
    let mut builder = PageRecordBuilder::new(url, title);

    for element in container.select(&selectors.blocks) {
        if is_inside_walked_block(element, container) {
            continue;
        }

        match element.value().name() {
            "h2" | "h3" => {
                builder.heading(collapsed_text(element));
            }
            "p" => {
                builder.paragraph(collapsed_text(element));
            }
            "pre" => {
                builder.code_block(element.text().collect::<String>());
            }
            "ul" | "ol" => {
                builder.list(list_items(element));
            }
            _ => {}
        }
    }

    Some(builder.build())
}

/// Resolves the title from the first selector with a non-empty match
fn extract_title(container: ElementRef<'_>, selectors: &[Selector]) -> String {
    selectors
        .iter()
        .find_map(|selector| {
            container
                .select(selector)
                .map(collapsed_text)
                .find(|text| !text.is_empty())
        })
        .unwrap_or_else(|| UNTITLED.to_string())
}

/// Direct `li` children of a list, in order
fn list_items(list: ElementRef<'_>) -> Vec<String> {
    list.children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "li")
        .map(collapsed_text)
        .collect()
}

/// True when an ancestor below the container is a `pre` or list whose text
/// has already been emitted
fn is_inside_walked_block(element: ElementRef<'_>, container: ElementRef<'_>) -> bool {
    for node in element.ancestors() {
        if node.id() == container.id() {
            return false;
        }
        if let Some(ancestor) = ElementRef::wrap(node) {
            if matches!(ancestor.value().name(), "pre" | "ul" | "ol") {
                return true;
            }
        }
    }
    false
}

/// Element text with runs of whitespace collapsed to single spaces
fn collapsed_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
