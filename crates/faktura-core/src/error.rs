//! Error types for the faktura-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the faktura library.
#[derive(Error, Debug)]
pub enum FakturaError {
    /// Input validation error (bad path, wrong extension).
    #[error("input error: {0}")]
    Input(#[from] InputError),

    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Gemini API error.
    #[error("Gemini error: {0}")]
    Gemini(#[from] GeminiError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised before any collaborator is invoked.
#[derive(Error, Debug)]
pub enum InputError {
    /// The input path does not exist.
    #[error("PDF file not found: {0}")]
    NotFound(PathBuf),

    /// The input path is not a regular file.
    #[error("path is not a file: {0}")]
    NotAFile(PathBuf),

    /// The input file does not have a .pdf extension.
    #[error("expected a .pdf file, got: {0}")]
    WrongExtension(PathBuf),
}

/// Errors related to PDF reading and page rendering.
#[derive(Error, Debug)]
pub enum PdfError {
    /// The PDF is password-protected and cannot be opened.
    #[error("PDF is password-protected: {path}")]
    Encrypted { path: PathBuf },

    /// Failed to open or read the PDF.
    #[error("failed to read PDF '{path}': {reason}")]
    Read { path: PathBuf, reason: String },

    /// Failed to produce page images.
    #[error("failed to render PDF '{path}': {reason}")]
    Render { path: PathBuf, reason: String },

    /// The PDF has no pages.
    #[error("PDF has no pages: {path}")]
    NoPages { path: PathBuf },
}

/// Errors related to the Gemini collaborator.
#[derive(Error, Debug)]
pub enum GeminiError {
    /// No API key was configured.
    #[error("FAKTURA_GEMINI_API_KEY is not set")]
    MissingApiKey,

    /// Transport, auth or quota failure talking to the API.
    #[error("Gemini API request failed: {0}")]
    Request(String),

    /// The API reply contained no extractable text content.
    #[error("Gemini returned an empty response")]
    EmptyReply,

    /// Vision extraction was requested with no page images.
    #[error("no images were provided for Gemini vision extraction")]
    NoImages,

    /// No JSON object could be located/parsed in the reply text.
    #[error("Gemini did not return valid JSON: {0}")]
    Json(String),

    /// A JSON object was found but violates the reply schema.
    #[error("Gemini response schema validation failed: {0}")]
    Schema(String),
}

/// Errors related to configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The requested config file does not exist.
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    /// The config file could not be parsed.
    #[error("failed to parse config file '{path}': {reason}")]
    Parse { path: PathBuf, reason: String },

    /// A merged setting failed validation.
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

/// Result type for the faktura library.
pub type Result<T> = std::result::Result<T, FakturaError>;
