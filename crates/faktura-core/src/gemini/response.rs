//! Parsing the model's raw reply text into a structured record.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use crate::error::GeminiError;

lazy_static! {
    static ref FENCED_JSON: Regex =
        Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").unwrap();
}

/// Normalized view of one model reply. Constructed once by
/// [`parse_reply_text`], consumed once by the pipeline.
#[derive(Debug, Clone)]
pub struct GeminiReply {
    /// Date as written on the invoice, if the model found one.
    pub invoice_date_raw: Option<String>,
    /// Date the model believes is ISO-formatted (not guaranteed valid).
    pub invoice_date_iso: Option<String>,
    /// Whitespace-collapsed, guaranteed non-empty description.
    pub short_description: String,
    /// Model-reported confidence; absent becomes 0.0. Range is NOT
    /// checked here, the pipeline clamps at the output boundary.
    pub confidence: f64,
    /// Free-text caveat from the model.
    pub notes: Option<String>,
}

/// Reply shape on the wire. Unknown fields are a schema violation,
/// matching the strictness the prompt demands of the model.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawReply {
    invoice_date_raw: Option<String>,
    invoice_date_iso: Option<String>,
    short_description: String,
    #[serde(default)]
    confidence: f64,
    notes: Option<String>,
}

/// Parse the raw reply text surrounding prose and all.
pub fn parse_reply_text(response_text: &str) -> Result<GeminiReply, GeminiError> {
    let payload = extract_json_object(response_text)?;

    let value: serde_json::Value =
        serde_json::from_str(&payload).map_err(|e| GeminiError::Json(e.to_string()))?;

    let raw: RawReply =
        serde_json::from_value(value).map_err(|e| GeminiError::Schema(e.to_string()))?;

    let short_description = raw
        .short_description
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if short_description.is_empty() {
        return Err(GeminiError::Schema(
            "short_description must not be empty".to_string(),
        ));
    }

    Ok(GeminiReply {
        invoice_date_raw: raw.invoice_date_raw,
        invoice_date_iso: raw.invoice_date_iso,
        short_description,
        confidence: raw.confidence,
        notes: raw.notes,
    })
}

/// Locate the JSON object inside arbitrary surrounding prose: a
/// fenced code block first, else first `{` to last `}`.
pub fn extract_json_object(text: &str) -> Result<String, GeminiError> {
    let stripped = text.trim();

    if let Some(captures) = FENCED_JSON.captures(stripped) {
        return Ok(captures[1].to_string());
    }

    let start = stripped.find('{');
    let end = stripped.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if end > start => Ok(stripped[start..=end].to_string()),
        _ => Err(GeminiError::Json(
            "could not find JSON object in Gemini response".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const REPLY: &str = r#"{"invoice_date_raw": "10 Feb 2026", "invoice_date_iso": "2026-02-10",
        "short_description": "kawa ziarnista", "confidence": 0.9, "notes": null}"#;

    #[test]
    fn test_parses_bare_json_object() {
        let reply = parse_reply_text(REPLY).unwrap();
        assert_eq!(reply.short_description, "kawa ziarnista");
        assert_eq!(reply.invoice_date_iso.as_deref(), Some("2026-02-10"));
        assert_eq!(reply.confidence, 0.9);
    }

    #[test]
    fn test_parses_fenced_json_block() {
        let text = format!("Here you go:\n```json\n{REPLY}\n```\nHope that helps!");
        let reply = parse_reply_text(&text).unwrap();
        assert_eq!(reply.short_description, "kawa ziarnista");
    }

    #[test]
    fn test_parses_untagged_fence() {
        let text = format!("```\n{REPLY}\n```");
        assert!(parse_reply_text(&text).is_ok());
    }

    #[test]
    fn test_brace_fallback_tolerates_prose() {
        let text = format!("The extracted data is {REPLY} as requested.");
        assert!(parse_reply_text(&text).is_ok());
    }

    #[test]
    fn test_no_json_object_is_a_parse_error() {
        let err = parse_reply_text("I could not read the invoice, sorry.").unwrap_err();
        assert!(matches!(err, GeminiError::Json(_)));
    }

    #[test]
    fn test_broken_json_is_a_parse_error() {
        let err = parse_reply_text(r#"{"short_description": "#).unwrap_err();
        assert!(matches!(err, GeminiError::Json(_)));
    }

    #[test]
    fn test_missing_description_is_a_schema_error() {
        let err = parse_reply_text(r#"{"confidence": 0.5}"#).unwrap_err();
        assert!(matches!(err, GeminiError::Schema(_)));
    }

    #[test]
    fn test_whitespace_only_description_is_a_schema_error() {
        let err =
            parse_reply_text(r#"{"short_description": "   \n  "}"#).unwrap_err();
        assert!(matches!(err, GeminiError::Schema(_)));
    }

    #[test]
    fn test_unknown_field_is_a_schema_error() {
        let err = parse_reply_text(
            r#"{"short_description": "kawa", "vendor": "Lumar"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, GeminiError::Schema(_)));
    }

    #[test]
    fn test_missing_confidence_defaults_to_zero() {
        let reply = parse_reply_text(r#"{"short_description": "kawa"}"#).unwrap();
        assert_eq!(reply.confidence, 0.0);
    }

    #[test]
    fn test_out_of_range_confidence_is_accepted_here() {
        let reply =
            parse_reply_text(r#"{"short_description": "kawa", "confidence": 1.7}"#).unwrap();
        assert_eq!(reply.confidence, 1.7);
    }

    #[test]
    fn test_description_whitespace_is_collapsed() {
        let reply =
            parse_reply_text(r#"{"short_description": "  kawa \n ziarnista  "}"#).unwrap();
        assert_eq!(reply.short_description, "kawa ziarnista");
    }
}
