//! Output sink trait and error types
//!
//! A sink turns a synthesized [`Document`] into an artifact on disk. The
//! document model is format-agnostic; the PDF sink is the only one shipped.

use crate::output::document::Document;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to create output directory {path}: {source}")]
    CreateDir {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to load code font {path}: {reason}")]
    Font { path: String, reason: String },
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Renders a document to a file
pub trait DocumentSink {
    /// Writes `document` to `path`, replacing any existing file
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Artifact written
    /// * `Err(OutputError)` - Rendering or writing failed
    fn render(&self, document: &Document, path: &Path) -> OutputResult<()>;

    /// Short name used in log lines
    fn name(&self) -> &'static str;
}
