//! Output path handling

use crate::output::traits::{OutputError, OutputResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Resolves the artifact path, appending `.pdf` when it is missing
///
/// The check is case-insensitive, so `Report.PDF` is kept as is.
///
/// # Examples
///
/// ```
/// use pdf_scraper::output::resolve_output_path;
/// use std::path::PathBuf;
///
/// assert_eq!(resolve_output_path("report"), PathBuf::from("report.pdf"));
/// assert_eq!(resolve_output_path("out/docs.pdf"), PathBuf::from("out/docs.pdf"));
/// ```
pub fn resolve_output_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    if trimmed.to_ascii_lowercase().ends_with(".pdf") {
        PathBuf::from(trimmed)
    } else {
        PathBuf::from(format!("{}.pdf", trimmed))
    }
}

/// Creates the parent directories of `path` if they do not exist
pub fn ensure_parent_dir(path: &Path) -> OutputResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            tracing::debug!("Creating output directory {}", parent.display());
            fs::create_dir_all(parent).map_err(|source| OutputError::CreateDir {
                path: parent.display().to_string(),
                source,
            })
        }
        _ => Ok(()),
    }
}
