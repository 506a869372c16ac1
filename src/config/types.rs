use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for pdf-scraper
///
/// Every section has defaults, so an empty TOML file (or no file at all)
/// yields a usable configuration once a start URL is supplied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub extraction: ExtractionConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Starting URL for the crawl (depth 0)
    #[serde(rename = "start-url")]
    pub start_url: String,

    /// Maximum link-hop depth from the start URL
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Number of pages fetched concurrently
    pub parallelism: u32,

    /// Fixed delay before every request (milliseconds)
    #[serde(rename = "delay-ms")]
    pub delay_ms: u64,

    /// Upper bound of the random jitter added to `delay_ms` (milliseconds)
    #[serde(rename = "random-delay-ms")]
    pub random_delay_ms: u64,

    /// Timeout for a single HTTP request (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Wall-clock budget for the whole crawl before draining (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Whether to consult robots.txt before fetching
    #[serde(rename = "respect-robots-txt")]
    pub respect_robots_txt: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            start_url: String::new(),
            max_depth: 2,
            parallelism: 2,
            delay_ms: 1000,
            random_delay_ms: 1000,
            request_timeout_secs: 30,
            timeout_secs: 300,
            respect_robots_txt: false,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// Optional URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "pdf-scraper".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `Name/Version` or `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// CSS selectors used by the page extractor
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Selector for the main article container
    #[serde(rename = "content-selector")]
    pub content_selector: String,

    /// Title selectors tried in order inside the container
    #[serde(rename = "title-selectors")]
    pub title_selectors: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            content_selector: "div.Article, article".to_string(),
            title_selectors: vec![
                ".Header h1".to_string(),
                ".Header h2".to_string(),
                "h1".to_string(),
                "h2".to_string(),
            ],
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the generated PDF
    pub path: String,

    /// Title stored in the PDF document info
    #[serde(rename = "document-title")]
    pub document_title: String,

    /// Author stored in the PDF document info
    pub author: String,

    /// TrueType font for code blocks; the bundled monospace font when unset
    #[serde(rename = "code-font")]
    pub code_font: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "output.pdf".to_string(),
            document_title: "Scraped Site Content".to_string(),
            author: "PDF Scraper".to_string(),
            code_font: None,
        }
    }
}
