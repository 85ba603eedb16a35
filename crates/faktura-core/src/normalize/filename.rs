//! Deterministic composition of the output filename stub.
//!
//! The stub feeds an at-most-one-destination rename downstream, so
//! everything here must be pure: identical inputs, identical stub.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::text::{sanitize_words, FALLBACK_DESCRIPTION, MAX_DESCRIPTION_WORDS};

/// Sentinel used when no invoice date normalized. A fixed literal,
/// never reformatted with the configured date separator.
pub const FALLBACK_DATE: &str = "unknown-date";

lazy_static! {
    static ref ISO_DATE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
}

/// User-configurable filename composition options. Tokens are kept
/// raw here ("space", "dot", literal characters) and normalized at
/// composition time; unknown tokens fall back to the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilenameOptions {
    /// Word/date-description separator token.
    pub separator: String,
    /// Free-text suffix appended after the description.
    pub suffix: String,
    /// Separator replacing the dashes of a canonical ISO date.
    pub date_separator: String,
}

impl Default for FilenameOptions {
    fn default() -> Self {
        Self {
            separator: "_".to_string(),
            suffix: String::new(),
            date_separator: "-".to_string(),
        }
    }
}

/// Compose the filename stub from a normalized date and a description.
pub fn compose_filename_stub(
    invoice_date: Option<&str>,
    short_description: Option<&str>,
    options: &FilenameOptions,
) -> String {
    let separator = normalize_separator(&options.separator);
    let date_separator = normalize_date_separator(&options.date_separator);

    let date_part = format_date_part(invoice_date, &date_separator);
    let desc_part = format_description_part(short_description, &separator);

    let mut stub = format!("{date_part}{separator}{desc_part}");

    let suffix = sanitize_suffix(&options.suffix);
    if !suffix.is_empty() {
        if !suffix.starts_with(&separator) && !suffix.starts_with(' ') {
            stub.push_str(&separator);
        }
        stub.push_str(&suffix);
    }
    stub
}

/// Defaults shorthand: `_` separator, `-` date separator, no suffix.
pub fn make_filename_stub(
    invoice_date: Option<&str>,
    short_description: Option<&str>,
) -> String {
    compose_filename_stub(invoice_date, short_description, &FilenameOptions::default())
}

fn format_date_part(invoice_date: Option<&str>, date_separator: &str) -> String {
    match invoice_date {
        Some(date) if !date.is_empty() => {
            if ISO_DATE.is_match(date) {
                date.replace('-', date_separator)
            } else {
                date.to_string()
            }
        }
        _ => FALLBACK_DATE.to_string(),
    }
}

fn format_description_part(short_description: Option<&str>, separator: &str) -> String {
    let words = short_description
        .map(|d| sanitize_words(d, MAX_DESCRIPTION_WORDS))
        .unwrap_or_default();
    if words.is_empty() {
        FALLBACK_DESCRIPTION.to_string()
    } else {
        words.join(separator)
    }
}

fn normalize_separator(raw: &str) -> String {
    if raw == " " {
        return " ".to_string();
    }
    match raw.trim().to_lowercase().as_str() {
        "underscore" | "_" => "_",
        "dash" | "hyphen" | "-" => "-",
        "space" => " ",
        _ => "_",
    }
    .to_string()
}

fn normalize_date_separator(raw: &str) -> String {
    match raw.trim().to_lowercase().as_str() {
        "dash" | "hyphen" | "-" => "-",
        "dot" | "." => ".",
        "underscore" | "_" => "_",
        _ => "-",
    }
    .to_string()
}

/// Trim, neutralize path separators, strip control characters.
fn sanitize_suffix(raw: &str) -> String {
    raw.trim()
        .replace(['/', '\\'], "-")
        .chars()
        .filter(|c| *c >= ' ' && *c != '\x7f')
        .collect()
}
