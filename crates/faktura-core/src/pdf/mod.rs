//! PDF ingestion: path validation, embedded text, page images.

mod ingest;
pub mod quality;

pub use ingest::{LopdfSource, DEFAULT_RENDER_DPI};
pub use quality::{is_usable_text, score_text_quality, USABLE_TEXT_THRESHOLD};

use std::path::{Path, PathBuf};

use crate::error::{InputError, PdfError};

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Result of reading embedded PDF text, one per processing run.
#[derive(Debug, Clone)]
pub struct TextExtraction {
    /// Raw per-page text, in page order.
    pub page_texts: Vec<String>,
    /// Non-blank, trimmed page texts joined with newlines.
    pub combined_text: String,
    /// Heuristic usability score in [0, 1].
    pub quality_score: f64,
    /// Number of pages actually read (bounded by max_pages).
    pub pages_examined: usize,
}

/// Trait for the PDF collaborator.
pub trait PdfSource {
    /// Read embedded text from at most `max_pages` pages.
    fn read_embedded_text(&self, path: &Path, max_pages: usize) -> Result<TextExtraction>;

    /// Produce PNG-encoded page images for at most `max_pages` pages.
    fn render_pages(&self, path: &Path, max_pages: usize, dpi: u32) -> Result<Vec<Vec<u8>>>;
}

/// Validate the input path before any collaborator is invoked.
///
/// Distinct failure kinds for a missing path, a directory, and a
/// non-`.pdf` extension (checked case-insensitively).
pub fn validate_input_pdf_path(path: &Path) -> std::result::Result<PathBuf, InputError> {
    if !path.exists() {
        return Err(InputError::NotFound(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(InputError::NotAFile(path.to_path_buf()));
    }
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);
    if extension.as_deref() != Some("pdf") {
        return Err(InputError::WrongExtension(path.to_path_buf()));
    }
    Ok(path.to_path_buf())
}
