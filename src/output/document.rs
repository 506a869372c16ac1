//! Document synthesis
//!
//! Turns the collected page records into a format-agnostic document: a
//! table of contents followed by one chapter per page. Synthesis is pure;
//! the same records always produce the same document regardless of the
//! order in which the crawl collected them.

use crate::config::OutputConfig;
use crate::extract::{PageRecord, Segment};
use crate::state::sort_by_url;
use chrono::{DateTime, Utc};

/// Document-level metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMeta {
    pub title: String,
    pub author: String,
    pub creator: String,
    pub created: DateTime<Utc>,
}

impl DocumentMeta {
    /// Builds metadata from the output configuration, stamped now
    pub fn from_config(config: &OutputConfig) -> Self {
        Self {
            title: config.document_title.clone(),
            author: config.author.clone(),
            creator: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            created: Utc::now(),
        }
    }
}

/// One line of the table of contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    /// 0 for a chapter, 1 for a sub-heading
    pub level: u8,
    pub text: String,
}

/// Renderable content block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Body(String),
    SubHeading(String),
    /// Code text, verbatim
    Code(String),
    Bullet(String),
}

/// One page's section of the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    /// 1-based chapter number
    pub number: usize,
    /// `"{n}. {title}"`
    pub heading: String,
    /// `"Source: {url}"`
    pub source: String,
    pub blocks: Vec<Block>,
}

/// A synthesized document, ready for a sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub meta: DocumentMeta,
    pub toc: Vec<TocEntry>,
    pub chapters: Vec<Chapter>,
}

impl Document {
    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }
}

/// Synthesizes the document from page records
///
/// Records are ordered ascending by URL (byte-wise) and numbered from 1.
/// Every chapter lists its sub-headings in the table of contents as
/// `"{n}.{m}. {heading}"`. A code-block reference that does not resolve
/// is dropped.
///
/// # Example
///
/// ```
/// use pdf_scraper::extract::PageRecordBuilder;
/// use pdf_scraper::output::{synthesize, Block, DocumentMeta};
/// use pdf_scraper::config::OutputConfig;
///
/// let mut page = PageRecordBuilder::new("https://example.com/a", "Intro");
/// page.code_block("fn main() {}");
/// let doc = synthesize(vec![page.build()], DocumentMeta::from_config(&OutputConfig::default()));
///
/// assert_eq!(doc.toc[0].text, "1. Intro");
/// assert_eq!(doc.chapters[0].blocks, vec![Block::Code("fn main() {}".to_string())]);
/// ```
pub fn synthesize(mut records: Vec<PageRecord>, meta: DocumentMeta) -> Document {
    sort_by_url(&mut records);

    let mut toc = Vec::new();
    let mut chapters = Vec::with_capacity(records.len());

    for (i, record) in records.iter().enumerate() {
        let number = i + 1;
        let heading = format!("{}. {}", number, record.title());

        toc.push(TocEntry {
            level: 0,
            text: heading.clone(),
        });
        for (j, sub) in record.headings().iter().enumerate() {
            toc.push(TocEntry {
                level: 1,
                text: format!("{}.{}. {}", number, j + 1, sub),
            });
        }

        chapters.push(Chapter {
            number,
            heading,
            source: format!("Source: {}", record.url()),
            blocks: chapter_blocks(record),
        });
    }

    Document {
        meta,
        toc,
        chapters,
    }
}

fn chapter_blocks(record: &PageRecord) -> Vec<Block> {
    let mut blocks = Vec::with_capacity(record.segments().len());

    for segment in record.segments() {
        match segment {
            Segment::Paragraph(text) => blocks.push(Block::Body(text.clone())),
            Segment::Heading(text) => blocks.push(Block::SubHeading(text.clone())),
            Segment::CodeBlockRef(index) => match record.code_block(*index) {
                Some(code) => blocks.push(Block::Code(code.to_string())),
                None => tracing::warn!(
                    "Dropping dangling code block reference {} in {}",
                    index,
                    record.url()
                ),
            },
            Segment::ListItems(items) => {
                blocks.extend(items.iter().cloned().map(Block::Bullet));
            }
        }
    }

    blocks
}
