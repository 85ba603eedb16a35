//! Gemini collaborator: prompts, HTTP client, reply parsing, catalog.

mod catalog;
mod client;
mod prompt;
mod response;

pub use catalog::{ModelCatalog, ModelMetadata};
pub use client::GeminiClient;
pub use prompt::{build_text_prompt, build_vision_prompt};
pub use response::{extract_json_object, parse_reply_text, GeminiReply};

use crate::error::GeminiError;

/// Result type for Gemini operations.
pub type Result<T> = std::result::Result<T, GeminiError>;

/// Trait for the inference collaborator.
///
/// The pipeline is generic over this seam so tests can substitute a
/// canned model; [`GeminiClient`] is the production implementation.
pub trait ModelExtractor {
    /// Interpret embedded invoice text.
    fn extract_from_text(
        &self,
        text: &str,
    ) -> impl std::future::Future<Output = Result<GeminiReply>> + Send;

    /// Interpret rendered page images (PNG buffers).
    fn extract_from_images(
        &self,
        images: &[Vec<u8>],
    ) -> impl std::future::Future<Output = Result<GeminiReply>> + Send;
}
