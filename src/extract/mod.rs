//! Content extraction
//!
//! - `record`: the `PageRecord` / `Segment` data model
//! - `extractor`: article content extraction from a parsed document
//! - `links`: discovery of same-domain links to follow

mod extractor;
mod links;
mod record;

pub use extractor::{extract, Selectors, UNTITLED};
pub use links::discover_links;
pub use record::{PageRecord, PageRecordBuilder, Segment};
