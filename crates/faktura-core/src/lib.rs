//! Core library for invoice PDF metadata extraction.
//!
//! This crate provides:
//! - PDF ingestion (embedded text, text quality scoring, page images)
//! - Gemini-backed extraction of the invoice date and a short
//!   purchase description
//! - Normalization into an ISO date and a filename-safe stub
//! - Layered configuration (defaults, JSON file, environment, CLI)

pub mod config;
pub mod error;
pub mod gemini;
pub mod models;
pub mod normalize;
pub mod pdf;
pub mod pipeline;

pub use config::{OcrMode, Settings, SettingsOverrides};
pub use error::{FakturaError, Result};
pub use gemini::{GeminiClient, GeminiReply, ModelCatalog, ModelExtractor};
pub use models::{ExtractionMethod, ExtractionResult};
pub use normalize::{compose_filename_stub, normalize_date, FilenameOptions};
pub use pdf::{LopdfSource, PdfSource, TextExtraction};
pub use pipeline::ExtractionPipeline;
