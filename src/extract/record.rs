//! Page record data model
//!
//! A [`PageRecord`] is the unit handed from the crawler to the document
//! synthesizer: one per distinct article page.

use std::fmt;

/// One piece of article content, in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Body text
    Paragraph(String),

    /// Sub-heading text (also listed in [`PageRecord::headings`])
    Heading(String),

    /// 1-based index into [`PageRecord::code_blocks`]
    CodeBlockRef(usize),

    /// Items of a bulleted or numbered list
    ListItems(Vec<String>),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Paragraph(text) | Self::Heading(text) => f.write_str(text),
            Self::CodeBlockRef(index) => write!(f, "[Code Block {}]", index),
            Self::ListItems(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str("\n")?;
                    }
                    write!(f, "\u{2022} {}", item)?;
                }
                Ok(())
            }
        }
    }
}

/// Structured content extracted from one crawled page
///
/// Records are only produced through [`PageRecordBuilder`], which keeps the
/// code-block references and the heading list consistent with the segments.
/// Fields are read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    url: String,
    title: String,
    headings: Vec<String>,
    segments: Vec<Segment>,
    code_blocks: Vec<String>,
}

impl PageRecord {
    /// Creates a record with no content
    pub fn new(url: String, title: String) -> Self {
        Self {
            url,
            title,
            headings: Vec::new(),
            segments: Vec::new(),
            code_blocks: Vec::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn headings(&self) -> &[String] {
        &self.headings
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn code_blocks(&self) -> &[String] {
        &self.code_blocks
    }

    /// Looks up a code block by its 1-based reference
    pub fn code_block(&self, index: usize) -> Option<&str> {
        index
            .checked_sub(1)
            .and_then(|i| self.code_blocks.get(i))
            .map(String::as_str)
    }

    /// Flattens the segments to plain text
    ///
    /// Code blocks appear as `[Code Block N]` placeholders; segments are
    /// separated by blank lines.
    pub fn content_text(&self) -> String {
        self.segments
            .iter()
            .map(Segment::to_string)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Builds a [`PageRecord`] segment by segment
///
/// Empty text is dropped so every stored segment carries content; code-block
/// numbering starts at 1 for each record.
#[derive(Debug)]
pub struct PageRecordBuilder {
    record: PageRecord,
}

impl PageRecordBuilder {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            record: PageRecord::new(url.into(), title.into()),
        }
    }

    pub fn paragraph(&mut self, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        if !text.trim().is_empty() {
            self.record.segments.push(Segment::Paragraph(text));
        }
        self
    }

    pub fn heading(&mut self, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        if !text.trim().is_empty() {
            self.record.headings.push(text.clone());
            self.record.segments.push(Segment::Heading(text));
        }
        self
    }

    /// Stores the code verbatim and emits a reference to it
    pub fn code_block(&mut self, code: impl Into<String>) -> &mut Self {
        let code = code.into();
        if !code.trim().is_empty() {
            self.record.code_blocks.push(code);
            let index = self.record.code_blocks.len();
            self.record.segments.push(Segment::CodeBlockRef(index));
        }
        self
    }

    pub fn list<I, S>(&mut self, items: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items: Vec<String> = items
            .into_iter()
            .map(Into::into)
            .filter(|item| !item.trim().is_empty())
            .collect();
        if !items.is_empty() {
            self.record.segments.push(Segment::ListItems(items));
        }
        self
    }

    pub fn build(self) -> PageRecord {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_block_numbering_is_per_record() {
        let mut first = PageRecordBuilder::new("https://example.com/a", "A");
        first.code_block("one").code_block("two");
        let first = first.build();

        let mut second = PageRecordBuilder::new("https://example.com/b", "B");
        second.code_block("three");
        let second = second.build();

        assert_eq!(
            first.segments(),
            &[Segment::CodeBlockRef(1), Segment::CodeBlockRef(2)]
        );
        assert_eq!(second.segments(), &[Segment::CodeBlockRef(1)]);
        assert_eq!(second.code_block(1), Some("three"));
    }

    #[test]
    fn test_code_block_lookup_bounds() {
        let mut builder = PageRecordBuilder::new("https://example.com/", "T");
        builder.code_block("fn main() {}");
        let record = builder.build();

        assert_eq!(record.code_block(0), None);
        assert_eq!(record.code_block(1), Some("fn main() {}"));
        assert_eq!(record.code_block(2), None);
    }

    #[test]
    fn test_code_block_kept_verbatim() {
        let code = "  if x {\n\treturn\n  }\n";
        let mut builder = PageRecordBuilder::new("https://example.com/", "T");
        builder.code_block(code);
        assert_eq!(builder.build().code_block(1), Some(code));
    }

    #[test]
    fn test_blank_content_dropped() {
        let mut builder = PageRecordBuilder::new("https://example.com/", "T");
        builder
            .paragraph("   ")
            .heading("")
            .code_block("\n\n")
            .list(vec!["", " "]);
        let record = builder.build();
        assert!(record.segments().is_empty());
        assert!(record.headings().is_empty());
        assert!(record.code_blocks().is_empty());
    }

    #[test]
    fn test_headings_follow_segments() {
        let mut builder = PageRecordBuilder::new("https://example.com/", "T");
        builder.heading("Intro").paragraph("text").heading("Usage");
        let record = builder.build();

        let from_segments: Vec<&str> = record
            .segments()
            .iter()
            .filter_map(|s| match s {
                Segment::Heading(h) => Some(h.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(record.headings(), &["Intro", "Usage"]);
        assert_eq!(from_segments, vec!["Intro", "Usage"]);
    }

    #[test]
    fn test_content_text_placeholders() {
        let mut builder = PageRecordBuilder::new("https://example.com/", "T");
        builder
            .heading("Setup")
            .paragraph("Install it.")
            .code_block("go get x")
            .list(vec!["one", "two"]);
        let text = builder.build().content_text();
        assert_eq!(
            text,
            "Setup\n\nInstall it.\n\n[Code Block 1]\n\n\u{2022} one\n\u{2022} two"
        );
    }
}
