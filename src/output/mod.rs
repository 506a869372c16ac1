//! Output module for turning crawl results into artifacts
//!
//! This module handles:
//! - Synthesizing the ordered document (table of contents and chapters)
//! - Rendering the document through a [`DocumentSink`] (PDF)
//! - Resolving the artifact path
//! - Crawl statistics

mod document;
mod path;
mod pdf;
pub mod stats;
mod traits;

pub use document::{synthesize, Block, Chapter, Document, DocumentMeta, TocEntry};
pub use path::{ensure_parent_dir, resolve_output_path};
pub use pdf::{encode_win_ansi, CodeFont, PdfSink};
pub use stats::{print_statistics, CrawlCounters, CrawlStatistics};
pub use traits::{DocumentSink, OutputError, OutputResult};

use crate::config::OutputConfig;
use crate::extract::PageRecord;
use std::path::PathBuf;

/// Synthesizes the records and writes them with `sink`
///
/// # Returns
///
/// * `Ok(PathBuf)` - Where the artifact was written
/// * `Err(OutputError)` - Rendering or writing failed
pub fn write_document(
    records: Vec<PageRecord>,
    config: &OutputConfig,
    sink: &dyn DocumentSink,
) -> OutputResult<PathBuf> {
    let path = resolve_output_path(&config.path);
    let document = synthesize(records, DocumentMeta::from_config(config));

    tracing::info!(
        "Rendering {} chapter(s) as {} to {}",
        document.chapter_count(),
        sink.name(),
        path.display()
    );
    sink.render(&document, &path)?;

    Ok(path)
}
