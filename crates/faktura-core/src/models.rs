//! Output data models for invoice extraction.

use serde::{Deserialize, Serialize};

/// Which extraction path produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Embedded PDF text was good enough to send as-is.
    PdfText,
    /// Page images were sent to the vision model.
    GeminiVision,
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionMethod::PdfText => write!(f, "pdf_text"),
            ExtractionMethod::GeminiVision => write!(f, "gemini_vision"),
        }
    }
}

/// Final, user-facing record for one processed invoice.
///
/// Every field is a primitive so the whole record serializes cleanly
/// at the output boundary. Fields that could legally be missing
/// degrade to the documented sentinels instead of carrying nulls into
/// the filename.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Original file name (not the full path).
    pub source_file: String,

    /// Canonical ISO date (`YYYY-MM-DD`), if any candidate normalized.
    pub invoice_date: Option<String>,

    /// The raw date string as written on the invoice, for diagnostics.
    pub invoice_date_raw: Option<String>,

    /// Sanitized, space-joined, lowercase ASCII description (never empty).
    pub short_description: String,

    /// Word count of `short_description`.
    pub short_description_words: usize,

    /// Composed filename base, without extension.
    pub filename_stub: String,

    /// Which extraction path was taken.
    pub extraction_method: ExtractionMethod,

    /// Model-reported confidence, clamped to [0, 1].
    pub confidence: f64,

    /// Human-readable diagnostics for every degraded path.
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extraction_method_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ExtractionMethod::PdfText).unwrap(),
            "\"pdf_text\""
        );
        assert_eq!(
            serde_json::to_string(&ExtractionMethod::GeminiVision).unwrap(),
            "\"gemini_vision\""
        );
    }

    #[test]
    fn test_extraction_result_round_trips_as_plain_json() {
        let result = ExtractionResult {
            source_file: "invoice.pdf".to_string(),
            invoice_date: Some("2026-02-10".to_string()),
            invoice_date_raw: Some("10 Feb 2026".to_string()),
            short_description: "kawa ziarnista".to_string(),
            short_description_words: 2,
            filename_stub: "2026-02-10_kawa_ziarnista".to_string(),
            extraction_method: ExtractionMethod::PdfText,
            confidence: 0.9,
            warnings: vec![],
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["extraction_method"], "pdf_text");
        assert_eq!(json["short_description_words"], 2);
        assert!(json["warnings"].as_array().unwrap().is_empty());
    }
}
