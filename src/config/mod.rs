//! Configuration module for pdf-scraper
//!
//! Configuration comes from three layers: built-in defaults, an optional
//! TOML file, and command-line overrides.
//!
//! # Example
//!
//! ```no_run
//! use pdf_scraper::config::{resolve_config, ConfigOverrides};
//! use std::path::Path;
//!
//! let overrides = ConfigOverrides {
//!     start_url: Some("https://go.dev/blog/".to_string()),
//!     ..Default::default()
//! };
//! let (config, _hash) = resolve_config(Some(Path::new("scraper.toml")), overrides).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, ExtractionConfig, OutputConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, parse_config, resolve_config, ConfigOverrides};
pub use validation::validate;
