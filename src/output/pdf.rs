//! PDF sink
//!
//! Lays the document out on A4 pages and writes it with `pdf-writer`.
//! Layout runs first and produces positioned drawing operations per page;
//! serialization then turns each page into a content stream.
//!
//! Prose uses the standard Type1 fonts. They carry no glyph metrics here,
//! so line widths are estimated per character, generously enough that
//! wrapped lines stay inside the margins.
//!
//! Code blocks use an embedded monospace TrueType font addressed by CID
//! (Identity-H) with a ToUnicode map, so code is written exactly as it was
//! extracted, tabs and carriage returns included.
//! Courier is only used for code when no such font can be loaded.

use crate::config::OutputConfig;
use crate::output::document::{Block, Document, DocumentMeta};
use crate::output::path::ensure_parent_dir;
use crate::output::traits::{DocumentSink, OutputError, OutputResult};
use chrono::{Datelike, Timelike};
use pdf_writer::types::{CidFontType, FontFlags, SystemInfo, UnicodeCmap};
use pdf_writer::{Content, Date, Finish, Name, Pdf, Rect, Ref, Str, TextStr};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::mem;
use std::path::Path;
use ttf_parser::{name_id, Face, GlyphId};

const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;

/// 20 mm
const MARGIN: f32 = 56.69;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const TOC_INDENT: f32 = 20.0;
const BULLET_INDENT: f32 = 10.0;
const CODE_PADDING: f32 = 4.0;
const CODE_BACKGROUND: f32 = 0.94;
const TAB_WIDTH: usize = 4;

const CODE_FONT_RESOURCE: Name<'static> = Name(b"F5");
const BUNDLED_CODE_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSansMono.ttf");

/// Built-in Type1 fonts used by the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Font {
    Regular,
    Bold,
    Italic,
    Mono,
}

impl Font {
    const ALL: [Font; 4] = [Font::Regular, Font::Bold, Font::Italic, Font::Mono];

    fn resource_name(self) -> Name<'static> {
        match self {
            Font::Regular => Name(b"F1"),
            Font::Bold => Name(b"F2"),
            Font::Italic => Name(b"F3"),
            Font::Mono => Name(b"F4"),
        }
    }

    fn base_font(self) -> Name<'static> {
        match self {
            Font::Regular => Name(b"Helvetica"),
            Font::Bold => Name(b"Helvetica-Bold"),
            Font::Italic => Name(b"Helvetica-Oblique"),
            Font::Mono => Name(b"Courier"),
        }
    }

    /// Approximate advance width of `c`, in em
    fn char_width(self, c: char) -> f32 {
        if self == Font::Mono {
            return 0.6;
        }
        let width = match c {
            'i' | 'j' | 'l' | '\'' | '|' | '.' | ',' | ':' | ';' | '!' => 0.28,
            'f' | 't' | 'r' | 'I' | ' ' | '(' | ')' | '[' | ']' | '-' | '/' => 0.34,
            'm' | 'w' | 'M' | 'W' | '@' | '%' => 0.89,
            'A'..='Z' => 0.72,
            _ => 0.58,
        };
        if self == Font::Bold {
            width * 1.06
        } else {
            width
        }
    }

    fn text_width(self, text: &str, size: f32) -> f32 {
        text.chars().map(|c| self.char_width(c)).sum::<f32>() * size
    }
}

#[derive(Debug, Clone, Copy)]
struct Style {
    font: Font,
    size: f32,
    leading: f32,
}

const TOC_TITLE: Style = Style {
    font: Font::Bold,
    size: 24.0,
    leading: 34.0,
};
const TOC_CHAPTER: Style = Style {
    font: Font::Bold,
    size: 12.0,
    leading: 20.0,
};
const TOC_SECTION: Style = Style {
    font: Font::Regular,
    size: 10.0,
    leading: 16.0,
};
const CHAPTER_HEADING: Style = Style {
    font: Font::Bold,
    size: 20.0,
    leading: 28.0,
};
const SOURCE: Style = Style {
    font: Font::Italic,
    size: 10.0,
    leading: 14.0,
};
const BODY: Style = Style {
    font: Font::Regular,
    size: 12.0,
    leading: 17.0,
};
const SUB_HEADING: Style = Style {
    font: Font::Bold,
    size: 14.0,
    leading: 20.0,
};
const CODE: Style = Style {
    font: Font::Mono,
    size: 10.0,
    leading: 14.0,
};
const FOOTER: Style = Style {
    font: Font::Regular,
    size: 9.0,
    leading: 12.0,
};

/// A positioned drawing operation in PDF user space
#[derive(Debug, Clone, PartialEq)]
enum DrawOp {
    Text {
        font: Font,
        size: f32,
        x: f32,
        y: f32,
        text: Vec<u8>,
    },
    /// Code in the embedded font, as two-byte CIDs
    Glyphs {
        size: f32,
        x: f32,
        y: f32,
        runs: Vec<GlyphRun>,
    },
    Fill {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        gray: f32,
    },
}

/// Glyph codes followed by extra advance, in thousandths of an em
#[derive(Debug, Clone, PartialEq)]
struct GlyphRun {
    codes: Vec<u8>,
    advance: f32,
}

/// TrueType font embedded for code blocks
#[derive(Clone)]
pub struct CodeFont {
    data: Cow<'static, [u8]>,
}

impl CodeFont {
    /// DejaVu Sans Mono, shipped with the crate
    pub fn bundled() -> Self {
        Self {
            data: Cow::Borrowed(BUNDLED_CODE_FONT),
        }
    }

    /// Loads a TrueType font file
    ///
    /// # Returns
    ///
    /// * `Ok(CodeFont)` - The file parsed and has TrueType outlines
    /// * `Err(OutputError::Font)` - Unreadable, unparsable, or CFF-based
    pub fn from_file(path: &Path) -> OutputResult<Self> {
        let font_error = |reason: String| OutputError::Font {
            path: path.display().to_string(),
            reason,
        };

        let data = fs::read(path).map_err(|e| font_error(e.to_string()))?;
        let face = Face::parse(&data, 0).map_err(|e| font_error(e.to_string()))?;
        if face.tables().glyf.is_none() {
            return Err(font_error("no TrueType outlines".to_string()));
        }

        Ok(Self {
            data: Cow::Owned(data),
        })
    }
}

impl fmt::Debug for CodeFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CodeFont({} bytes)", self.data.len())
    }
}

/// A character of the code font and the glyph drawn for it
#[derive(Debug, Clone, Copy)]
struct CodeGlyph {
    ch: char,
    gid: u16,
    /// Advance in thousandths of an em
    width: f32,
}

/// Assigns CIDs to the characters of code blocks
///
/// Every distinct character gets its own CID, starting at 1 in first-use
/// order, so each code maps back to exactly one character. Tabs and
/// carriage returns are zero-width; a tab's advance to the next stop is a
/// positioning adjustment after it. Characters the font lacks draw as
/// `.notdef` but keep their own CID and Unicode mapping.
struct CodeEncoder<'a> {
    face: Face<'a>,
    data: &'a [u8],
    cids: HashMap<char, u16>,
    glyphs: Vec<CodeGlyph>,
    /// Width of one column, in thousandths of an em
    cell: f32,
}

impl<'a> CodeEncoder<'a> {
    fn new(font: &'a CodeFont) -> Option<Self> {
        let data: &'a [u8] = &font.data;
        let face = match Face::parse(data, 0) {
            Ok(face) => face,
            Err(e) => {
                tracing::warn!("Code font unusable ({}), using Courier for code", e);
                return None;
            }
        };

        let mut encoder = Self {
            face,
            data,
            cids: HashMap::new(),
            glyphs: Vec::new(),
            cell: 0.0,
        };
        encoder.cell = encoder.advance(encoder.glyph(' '));
        Some(encoder)
    }

    fn scale(&self, units: f32) -> f32 {
        units * 1000.0 / f32::from(self.face.units_per_em())
    }

    fn glyph(&self, c: char) -> GlyphId {
        self.face.glyph_index(c).unwrap_or(GlyphId(0))
    }

    fn advance(&self, glyph: GlyphId) -> f32 {
        self.scale(f32::from(self.face.glyph_hor_advance(glyph).unwrap_or(0)))
    }

    fn cid(&mut self, c: char) -> u16 {
        if let Some(&cid) = self.cids.get(&c) {
            return cid;
        }
        if self.glyphs.len() >= usize::from(u16::MAX) {
            return 0;
        }

        let (glyph, width) = match c {
            '\t' | '\r' => (self.glyph(' '), 0.0),
            _ => {
                let glyph = self.glyph(c);
                (glyph, self.advance(glyph))
            }
        };
        self.glyphs.push(CodeGlyph {
            ch: c,
            gid: glyph.0,
            width,
        });

        let cid = self.glyphs.len() as u16;
        self.cids.insert(c, cid);
        cid
    }

    /// Encodes one display line of code
    fn encode_line(&mut self, line: &str) -> Vec<GlyphRun> {
        let mut runs = Vec::new();
        let mut codes = Vec::new();
        let mut column = 0;

        for c in line.chars() {
            codes.extend_from_slice(&self.cid(c).to_be_bytes());
            let span = column_span(c, column);
            column += span;
            if c == '\t' {
                runs.push(GlyphRun {
                    codes: mem::take(&mut codes),
                    advance: span as f32 * self.cell,
                });
            }
        }

        if !codes.is_empty() {
            runs.push(GlyphRun {
                codes,
                advance: 0.0,
            });
        }
        runs
    }

    fn postscript_name(&self) -> String {
        self.face
            .names()
            .into_iter()
            .filter(|name| name.name_id == name_id::POST_SCRIPT_NAME)
            .find_map(|name| name.to_string())
            .filter(|name| !name.is_empty() && name.chars().all(|c| c.is_ascii_graphic()))
            .unwrap_or_else(|| "CodeMono".to_string())
    }
}

/// Writes documents as PDF files
#[derive(Debug, Clone)]
pub struct PdfSink {
    code_font: Option<CodeFont>,
}

impl Default for PdfSink {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfSink {
    /// Sink that sets code in the bundled monospace font
    pub fn new() -> Self {
        Self::with_code_font(Some(CodeFont::bundled()))
    }

    /// Sink with an explicit code font; `None` sets code in Courier
    pub fn with_code_font(code_font: Option<CodeFont>) -> Self {
        Self { code_font }
    }

    /// Sink for the output configuration
    ///
    /// `code-font` replaces the bundled font when set.
    pub fn from_config(config: &OutputConfig) -> OutputResult<Self> {
        let code_font = match &config.code_font {
            Some(path) => CodeFont::from_file(path)?,
            None => CodeFont::bundled(),
        };
        Ok(Self::with_code_font(Some(code_font)))
    }

    /// Renders the document to PDF bytes without touching the filesystem
    pub fn render_bytes(&self, document: &Document) -> Vec<u8> {
        let encoder = self.code_font.as_ref().and_then(CodeEncoder::new);
        let layout = layout(document, encoder);
        tracing::debug!(
            "Laid out {} chapter(s) on {} PDF page(s)",
            document.chapter_count(),
            layout.pages.len()
        );
        write_pdf(&document.meta, &layout)
    }
}

impl DocumentSink for PdfSink {
    fn render(&self, document: &Document, path: &Path) -> OutputResult<()> {
        let bytes = self.render_bytes(document);
        ensure_parent_dir(path)?;
        fs::write(path, &bytes).map_err(|source| OutputError::Write {
            path: path.display().to_string(),
            source,
        })?;
        tracing::info!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "pdf"
    }
}

/// Pages of drawing operations, plus the code font they reference
struct Layout<'a> {
    pages: Vec<Vec<DrawOp>>,
    code_font: Option<CodeEncoder<'a>>,
}

/// Page-by-page layout state
struct Layouter<'a> {
    finished: Vec<Vec<DrawOp>>,
    current: Vec<DrawOp>,
    started: bool,
    /// Top of the next line box
    cursor: f32,
    code_font: Option<CodeEncoder<'a>>,
}

impl<'a> Layouter<'a> {
    fn new(code_font: Option<CodeEncoder<'a>>) -> Self {
        Self {
            finished: Vec::new(),
            current: Vec::new(),
            started: false,
            cursor: PAGE_HEIGHT - MARGIN,
            code_font,
        }
    }

    fn new_page(&mut self) {
        if self.started {
            self.finished.push(mem::take(&mut self.current));
        }
        self.started = true;
        self.cursor = PAGE_HEIGHT - MARGIN;
    }

    fn ensure_room(&mut self, height: f32) {
        if !self.started || self.cursor - height < MARGIN {
            self.new_page();
        }
    }

    fn space(&mut self, height: f32) {
        self.cursor -= height;
    }

    fn baseline(&self, style: Style) -> f32 {
        self.cursor - style.leading + (style.leading - style.size) / 2.0 + style.size * 0.22
    }

    fn text_line(&mut self, style: Style, indent: f32, text: &str) {
        self.ensure_room(style.leading);
        let baseline = self.baseline(style);
        let encoded = encode_win_ansi(text);
        if !encoded.is_empty() {
            self.current.push(DrawOp::Text {
                font: style.font,
                size: style.size,
                x: MARGIN + indent,
                y: baseline,
                text: encoded,
            });
        }
        self.cursor -= style.leading;
    }

    fn paragraph(&mut self, style: Style, indent: f32, text: &str) {
        for line in wrap_words(text, style.font, style.size, CONTENT_WIDTH - indent) {
            self.text_line(style, indent, &line);
        }
    }

    fn bullet(&mut self, text: &str) {
        let marker = "\u{2022} ";
        let hang = BODY.font.text_width(marker, BODY.size);
        let width = CONTENT_WIDTH - BULLET_INDENT - hang;

        for (i, line) in wrap_words(text, BODY.font, BODY.size, width)
            .into_iter()
            .enumerate()
        {
            if i == 0 {
                self.text_line(BODY, BULLET_INDENT, &format!("{}{}", marker, line));
            } else {
                self.text_line(BODY, BULLET_INDENT + hang, &line);
            }
        }
    }

    fn code(&mut self, code: &str) {
        let cell = match &self.code_font {
            Some(encoder) => encoder.cell / 1000.0,
            None => CODE.font.char_width(' '),
        };
        let max_columns =
            ((CONTENT_WIDTH - 2.0 * CODE_PADDING) / (cell * CODE.size)).floor() as usize;
        let max_columns = max_columns.max(TAB_WIDTH);

        let Some(mut encoder) = self.code_font.take() else {
            for raw in code.lines() {
                for chunk in wrap_columns(&expand_tabs(raw), max_columns) {
                    self.code_background();
                    self.text_line(CODE, CODE_PADDING, &chunk);
                }
            }
            return;
        };

        for raw in code_lines(code) {
            for chunk in wrap_columns(raw, max_columns) {
                self.code_background();
                let baseline = self.baseline(CODE);
                let runs = encoder.encode_line(&chunk);
                if !runs.is_empty() {
                    self.current.push(DrawOp::Glyphs {
                        size: CODE.size,
                        x: MARGIN + CODE_PADDING,
                        y: baseline,
                        runs,
                    });
                }
                self.cursor -= CODE.leading;
            }
        }
        self.code_font = Some(encoder);
    }

    fn code_background(&mut self) {
        self.ensure_room(CODE.leading);
        self.current.push(DrawOp::Fill {
            x: MARGIN,
            y: self.cursor - CODE.leading,
            width: CONTENT_WIDTH,
            height: CODE.leading,
            gray: CODE_BACKGROUND,
        });
    }

    fn finish(mut self) -> Layout<'a> {
        if self.started {
            self.finished.push(self.current);
        }
        Layout {
            pages: self.finished,
            code_font: self.code_font,
        }
    }
}

/// Lays out the table of contents and chapters
fn layout<'a>(document: &Document, code_font: Option<CodeEncoder<'a>>) -> Layout<'a> {
    let mut layouter = Layouter::new(code_font);

    layouter.new_page();
    layouter.text_line(TOC_TITLE, 0.0, "Table of Contents");
    layouter.space(12.0);

    for (i, entry) in document.toc.iter().enumerate() {
        if entry.level == 0 {
            if i > 0 {
                layouter.space(6.0);
            }
            layouter.paragraph(TOC_CHAPTER, 0.0, &entry.text);
        } else {
            layouter.paragraph(TOC_SECTION, TOC_INDENT, &entry.text);
        }
    }

    for chapter in &document.chapters {
        layouter.new_page();
        layouter.paragraph(CHAPTER_HEADING, 0.0, &chapter.heading);
        layouter.space(4.0);
        layouter.paragraph(SOURCE, 0.0, &chapter.source);
        layouter.space(12.0);

        for block in &chapter.blocks {
            match block {
                Block::Body(text) => {
                    layouter.paragraph(BODY, 0.0, text);
                    layouter.space(6.0);
                }
                Block::SubHeading(text) => {
                    layouter.space(6.0);
                    // Keep the heading with the first lines that follow it
                    layouter.ensure_room(SUB_HEADING.leading + 2.0 * BODY.leading);
                    layouter.paragraph(SUB_HEADING, 0.0, text);
                    layouter.space(4.0);
                }
                Block::Code(code) => {
                    layouter.code(code);
                    layouter.space(10.0);
                }
                Block::Bullet(text) => {
                    layouter.bullet(text);
                    layouter.space(2.0);
                }
            }
        }
    }

    let mut layout = layouter.finish();
    number_pages(&mut layout.pages);
    layout
}

fn number_pages(pages: &mut [Vec<DrawOp>]) {
    let total = pages.len();
    for (i, page) in pages.iter_mut().enumerate() {
        let label = format!("{} / {}", i + 1, total);
        let width = FOOTER.font.text_width(&label, FOOTER.size);
        page.push(DrawOp::Text {
            font: FOOTER.font,
            size: FOOTER.size,
            x: (PAGE_WIDTH - width) / 2.0,
            y: MARGIN / 2.0,
            text: encode_win_ansi(&label),
        });
    }
}

/// Greedy word wrap; words wider than a line are split by character
fn wrap_words(text: &str, font: Font, size: f32, width: f32) -> Vec<String> {
    let space = font.char_width(' ') * size;
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0;

    for word in text.split_whitespace() {
        let word_width = font.text_width(word, size);

        if !current.is_empty() && current_width + space + word_width <= width {
            current.push(' ');
            current.push_str(word);
            current_width += space + word_width;
            continue;
        }

        if !current.is_empty() {
            lines.push(mem::take(&mut current));
            current_width = 0.0;
        }

        if word_width <= width {
            current.push_str(word);
            current_width = word_width;
            continue;
        }

        for c in word.chars() {
            let char_width = font.char_width(c) * size;
            if !current.is_empty() && current_width + char_width > width {
                lines.push(mem::take(&mut current));
                current_width = 0.0;
            }
            current.push(c);
            current_width += char_width;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Lines of a code block, with carriage returns kept
fn code_lines(code: &str) -> impl Iterator<Item = &str> {
    code.strip_suffix('\n').unwrap_or(code).split('\n')
}

/// Columns `c` occupies when it starts at `column`
fn column_span(c: char, column: usize) -> usize {
    match c {
        '\t' => TAB_WIDTH - column % TAB_WIDTH,
        '\r' => 0,
        _ => 1,
    }
}

/// Splits a code line into chunks of at most `max_columns` columns
///
/// An empty line yields one empty chunk so blank lines keep their height.
fn wrap_columns(line: &str, max_columns: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut column = 0;

    for c in line.chars() {
        if column > 0 && column + column_span(c, column) > max_columns {
            chunks.push(mem::take(&mut current));
            column = 0;
        }
        column += column_span(c, column);
        current.push(c);
    }

    chunks.push(current);
    chunks
}

/// Expands tabs to the next multiple of the tab width
fn expand_tabs(line: &str) -> String {
    let mut expanded = String::with_capacity(line.len());
    let mut column = 0;
    for c in line.chars() {
        if c == '\t' {
            let spaces = TAB_WIDTH - column % TAB_WIDTH;
            expanded.extend(std::iter::repeat(' ').take(spaces));
            column += spaces;
        } else {
            expanded.push(c);
            column += 1;
        }
    }
    expanded
}

/// Encodes text for the standard fonts' WinAnsi encoding
///
/// Characters outside the encoding become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

fn win_ansi_byte(c: char) -> u8 {
    match c {
        '\t' => b' ',
        ' '..='~' | '\u{a0}'..='\u{ff}' => c as u8,
        '\u{20ac}' => 0x80,
        '\u{201a}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201e}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02c6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8a,
        '\u{2039}' => 0x8b,
        '\u{0152}' => 0x8c,
        '\u{017d}' => 0x8e,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201c}' => 0x93,
        '\u{201d}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02dc}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9a,
        '\u{203a}' => 0x9b,
        '\u{0153}' => 0x9c,
        '\u{017e}' => 0x9e,
        '\u{0178}' => 0x9f,
        _ => b'?',
    }
}

fn write_pdf(meta: &DocumentMeta, layout: &Layout) -> Vec<u8> {
    let pages = &layout.pages;
    let mut pdf = Pdf::new();
    let mut alloc = Ref::new(1);

    let catalog_id = alloc.bump();
    let page_tree_id = alloc.bump();
    let info_id = alloc.bump();
    let font_ids: Vec<(Font, Ref)> = Font::ALL.iter().map(|&font| (font, alloc.bump())).collect();
    let page_ids: Vec<(Ref, Ref)> = pages.iter().map(|_| (alloc.bump(), alloc.bump())).collect();

    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id)
        .kids(page_ids.iter().map(|(page_id, _)| *page_id))
        .count(page_ids.len() as i32);

    for (font, id) in &font_ids {
        pdf.type1_font(*id)
            .base_font(font.base_font())
            .encoding_predefined(Name(b"WinAnsiEncoding"));
    }

    let code_font_id = layout
        .code_font
        .as_ref()
        .filter(|encoder| !encoder.glyphs.is_empty())
        .map(|encoder| write_code_font(&mut pdf, &mut alloc, encoder));

    let media_box = Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT);
    for ((page_id, content_id), ops) in page_ids.iter().zip(pages) {
        let mut page = pdf.page(*page_id);
        page.media_box(media_box);
        page.parent(page_tree_id);
        page.contents(*content_id);

        let mut resources = page.resources();
        let mut fonts = resources.fonts();
        for (font, id) in &font_ids {
            fonts.pair(font.resource_name(), *id);
        }
        if let Some(id) = code_font_id {
            fonts.pair(CODE_FONT_RESOURCE, id);
        }
        fonts.finish();
        resources.finish();
        page.finish();

        pdf.stream(*content_id, &content_stream(ops));
    }

    let mut info = pdf.document_info(info_id);
    info.title(TextStr(&meta.title));
    info.author(TextStr(&meta.author));
    info.creator(TextStr(&meta.creator));
    info.creation_date(pdf_date(meta));
    info.finish();

    pdf.finish()
}

/// Writes the code font as a Type0 font over a CIDFontType2 descendant
///
/// Returns the reference of the Type0 font dictionary.
fn write_code_font(pdf: &mut Pdf, alloc: &mut Ref, encoder: &CodeEncoder) -> Ref {
    let type0_id = alloc.bump();
    let cid_font_id = alloc.bump();
    let descriptor_id = alloc.bump();
    let font_file_id = alloc.bump();
    let to_unicode_id = alloc.bump();
    let gid_map_id = alloc.bump();

    let postscript_name = encoder.postscript_name();
    let base_font = Name(postscript_name.as_bytes());
    let system_info = SystemInfo {
        registry: Str(b"Adobe"),
        ordering: Str(b"Identity"),
        supplement: 0,
    };

    pdf.type0_font(type0_id)
        .base_font(base_font)
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_id)
        .to_unicode(to_unicode_id);

    let mut cid_font = pdf.cid_font(cid_font_id);
    cid_font.subtype(CidFontType::Type2);
    cid_font.base_font(base_font);
    cid_font.system_info(system_info);
    cid_font.font_descriptor(descriptor_id);
    cid_font.default_width(encoder.cell);
    cid_font.cid_to_gid_map_stream(gid_map_id);
    cid_font
        .widths()
        .consecutive(1, encoder.glyphs.iter().map(|glyph| glyph.width));
    cid_font.finish();

    let face = &encoder.face;
    let scale = |units: i16| encoder.scale(f32::from(units));
    let bbox = face.global_bounding_box();
    pdf.font_descriptor(descriptor_id)
        .name(base_font)
        .flags(FontFlags::FIXED_PITCH | FontFlags::NON_SYMBOLIC)
        .bbox(Rect::new(
            scale(bbox.x_min),
            scale(bbox.y_min),
            scale(bbox.x_max),
            scale(bbox.y_max),
        ))
        .italic_angle(face.italic_angle().unwrap_or(0.0))
        .ascent(scale(face.ascender()))
        .descent(scale(face.descender()))
        .cap_height(scale(face.capital_height().unwrap_or(face.ascender())))
        .stem_v(80.0)
        .font_file2(font_file_id);

    pdf.stream(font_file_id, encoder.data)
        .pair(Name(b"Length1"), encoder.data.len() as i32);

    let mut to_unicode: UnicodeCmap = UnicodeCmap::new(Name(b"Custom"), system_info);
    for (i, glyph) in encoder.glyphs.iter().enumerate() {
        to_unicode.pair(i as u16 + 1, glyph.ch);
    }
    let to_unicode = to_unicode.finish();
    pdf.cmap(to_unicode_id, &to_unicode);

    // CID 0 stays on .notdef
    let mut gid_map = vec![0u8; 2];
    for glyph in &encoder.glyphs {
        gid_map.extend_from_slice(&glyph.gid.to_be_bytes());
    }
    pdf.stream(gid_map_id, &gid_map);

    tracing::debug!(
        "Embedded code font {} with {} glyph(s)",
        postscript_name,
        encoder.glyphs.len()
    );
    type0_id
}

fn content_stream(ops: &[DrawOp]) -> Vec<u8> {
    let mut content = Content::new();

    for op in ops {
        match op {
            DrawOp::Fill {
                x,
                y,
                width,
                height,
                gray,
            } => {
                content.save_state();
                content.set_fill_gray(*gray);
                content.rect(*x, *y, *width, *height);
                content.fill_nonzero();
                content.restore_state();
            }
            DrawOp::Text {
                font,
                size,
                x,
                y,
                text,
            } => {
                content.begin_text();
                content.set_font(font.resource_name(), *size);
                content.next_line(*x, *y);
                content.show(Str(text.as_slice()));
                content.end_text();
            }
            DrawOp::Glyphs { size, x, y, runs } => {
                content.begin_text();
                content.set_font(CODE_FONT_RESOURCE, *size);
                content.next_line(*x, *y);
                {
                    let mut show = content.show_positioned();
                    let mut items = show.items();
                    for run in runs {
                        items.show(Str(run.codes.as_slice()));
                        if run.advance != 0.0 {
                            items.adjust(-run.advance);
                        }
                    }
                }
                content.end_text();
            }
        }
    }

    content.finish()
}

fn pdf_date(meta: &DocumentMeta) -> Date {
    let created = meta.created;
    Date::new(created.year().clamp(0, 9999) as u16)
        .month(created.month() as u8)
        .day(created.day() as u8)
        .hour(created.hour() as u8)
        .minute(created.minute() as u8)
        .second(created.second() as u8)
        .utc_offset_hour(0)
        .utc_offset_minute(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::PageRecordBuilder;
    use crate::output::document::synthesize;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn meta() -> DocumentMeta {
        DocumentMeta {
            title: "Docs".to_string(),
            author: "Tester".to_string(),
            creator: "pdf-scraper".to_string(),
            created: Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap(),
        }
    }

    fn texts(page: &[DrawOp]) -> Vec<Vec<u8>> {
        page.iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Maps the code lines of a page back to text through the CID table
    fn code_texts(page: &[DrawOp], encoder: &CodeEncoder) -> Vec<String> {
        page.iter()
            .filter_map(|op| match op {
                DrawOp::Glyphs { runs, .. } => Some(
                    runs.iter()
                        .flat_map(|run| run.codes.chunks(2))
                        .map(|code| {
                            let cid = u16::from_be_bytes([code[0], code[1]]);
                            encoder.glyphs[usize::from(cid) - 1].ch
                        })
                        .collect(),
                ),
                _ => None,
            })
            .collect()
    }

    fn code_document(code: &str) -> Document {
        let mut builder = PageRecordBuilder::new("https://example.com/code", "Code");
        builder.code_block(code);
        synthesize(vec![builder.build()], meta())
    }

    fn two_chapter_document() -> Document {
        let mut a = PageRecordBuilder::new("https://example.com/a", "Alpha");
        a.paragraph("First page").heading("Setup");
        let mut b = PageRecordBuilder::new("https://example.com/b", "Beta");
        b.code_block("fn main() {}");
        synthesize(vec![b.build(), a.build()], meta())
    }

    #[test]
    fn test_encode_win_ansi() {
        assert_eq!(encode_win_ansi("abc"), b"abc".to_vec());
        assert_eq!(encode_win_ansi("caf\u{e9}"), vec![b'c', b'a', b'f', 0xe9]);
        assert_eq!(
            encode_win_ansi("\u{2022}\u{2014}\u{2018}\u{2019}"),
            vec![0x95, 0x97, 0x91, 0x92]
        );
        assert_eq!(encode_win_ansi("\u{65e5}"), b"?".to_vec());
    }

    #[test]
    fn test_expand_tabs() {
        assert_eq!(expand_tabs("\tx"), "    x");
        assert_eq!(expand_tabs("ab\tc"), "ab  c");
        assert_eq!(expand_tabs("no tabs"), "no tabs");
    }

    #[test]
    fn test_wrap_columns() {
        assert_eq!(wrap_columns("", 10), vec![String::new()]);
        assert_eq!(wrap_columns("abcdef", 4), vec!["abcd", "ef"]);
        assert_eq!(wrap_columns("ab\tc", 4), vec!["ab\t", "c"]);
        assert_eq!(wrap_columns("abcd\r", 4), vec!["abcd\r"]);
    }

    #[test]
    fn test_code_lines_keep_carriage_returns() {
        let lines: Vec<&str> = code_lines("a\r\nb\n").collect();
        assert_eq!(lines, vec!["a\r", "b"]);
    }

    #[test]
    fn test_wrap_words_fits_width() {
        let text = "the quick brown fox jumps over the lazy dog ".repeat(20);
        let lines = wrap_words(&text, Font::Regular, 12.0, CONTENT_WIDTH);

        assert!(lines.len() > 1);
        for line in &lines {
            assert!(Font::Regular.text_width(line, 12.0) <= CONTENT_WIDTH + 0.01);
        }
        assert_eq!(lines.join(" "), text.trim());
    }

    #[test]
    fn test_wrap_words_splits_long_word() {
        let word = "x".repeat(500);
        let lines = wrap_words(&word, Font::Regular, 12.0, 100.0);

        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn test_toc_then_one_page_per_chapter() {
        let pages = layout(&two_chapter_document(), None).pages;

        assert_eq!(pages.len(), 3);
        assert_eq!(texts(&pages[0])[0], b"Table of Contents".to_vec());
        assert_eq!(texts(&pages[1])[0], b"1. Alpha".to_vec());
        assert_eq!(texts(&pages[2])[0], b"2. Beta".to_vec());
    }

    #[test]
    fn test_code_lines_have_background() {
        let font = CodeFont::bundled();
        let layout = layout(&two_chapter_document(), CodeEncoder::new(&font));
        let encoder = layout.code_font.as_ref().unwrap();
        let chapter = &layout.pages[2];

        let fill = chapter
            .iter()
            .position(|op| matches!(op, DrawOp::Fill { .. }))
            .unwrap();
        assert!(matches!(chapter[fill + 1], DrawOp::Glyphs { .. }));
        assert_eq!(code_texts(chapter, encoder), vec!["fn main() {}"]);
    }

    #[test]
    fn test_code_block_is_verbatim() {
        let code = "if a\t{ x \u{2192} y } // \u{65e5}\r\nend";
        let font = CodeFont::bundled();
        let layout = layout(&code_document(code), CodeEncoder::new(&font));
        let encoder = layout.code_font.as_ref().unwrap();

        let lines = code_texts(&layout.pages[1], encoder);
        assert_eq!(lines, vec!["if a\t{ x \u{2192} y } // \u{65e5}\r", "end"]);
        assert_eq!(lines.join("\n"), code);

        // The tab at column 4 advances to the next stop, four cells on
        let tab_run = layout.pages[1]
            .iter()
            .find_map(|op| match op {
                DrawOp::Glyphs { runs, .. } if runs.len() > 1 => Some(runs[0].clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(tab_run.codes.len(), 10);
        assert_eq!(tab_run.advance, 4.0 * encoder.cell);
    }

    #[test]
    fn test_code_falls_back_to_courier() {
        let pages = layout(&code_document("a\tb \u{2192}"), None).pages;

        let code: Vec<_> = pages[1]
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { font: Font::Mono, text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(code, vec![b"a   b ?".to_vec()]);
    }

    #[test]
    fn test_code_font_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let font_path = temp_dir.path().join("mono.ttf");
        fs::write(&font_path, BUNDLED_CODE_FONT).unwrap();
        assert!(CodeFont::from_file(&font_path).is_ok());

        let junk_path = temp_dir.path().join("junk.ttf");
        fs::write(&junk_path, b"not a font").unwrap();
        assert!(matches!(
            CodeFont::from_file(&junk_path),
            Err(OutputError::Font { .. })
        ));
        assert!(CodeFont::from_file(&temp_dir.path().join("missing.ttf")).is_err());
    }

    #[test]
    fn test_long_chapter_paginates_within_margins() {
        let mut builder = PageRecordBuilder::new("https://example.com/long", "Long");
        for i in 0..200 {
            builder.paragraph(format!("Paragraph number {} with some filler text.", i));
        }
        let doc = synthesize(vec![builder.build()], meta());
        let pages = layout(&doc, None).pages;

        assert!(pages.len() > 3);
        for page in &pages {
            for op in page {
                if let DrawOp::Text { y, .. } = op {
                    assert!(*y >= MARGIN / 2.0);
                    assert!(*y <= PAGE_HEIGHT - MARGIN);
                }
            }
        }
    }

    #[test]
    fn test_render_writes_pdf() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("out.pdf");

        PdfSink::new()
            .render(&two_chapter_document(), &path)
            .unwrap();

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Count 3"));
        assert!(text.contains("/Helvetica-Bold"));
        assert!(text.contains("/WinAnsiEncoding"));
        assert!(text.contains("/Identity-H"));
        assert!(text.contains("/CIDFontType2"));
        assert!(text.contains("/ToUnicode"));
        assert!(text.contains("/FontFile2"));
    }

    #[test]
    fn test_code_font_embedded_only_when_used() {
        let mut builder = PageRecordBuilder::new("https://example.com/prose", "Prose");
        builder.paragraph("No code here");
        let doc = synthesize(vec![builder.build()], meta());

        let bytes = PdfSink::new().render_bytes(&doc);
        assert!(!String::from_utf8_lossy(&bytes).contains("/FontFile2"));
    }
}
