//! Normalization of loosely-formatted invoice dates into ISO form.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

/// Explicit formats tried first, in order. Bare numeric triples are
/// deliberately absent: they go through the disambiguation step so
/// that `02/10/2026` resolves via the documented month-first policy
/// instead of whichever numeric pattern happens to be listed first.
const EXPLICIT_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d %Y",
    "%B %d %Y",
    "%d-%b-%Y",
    "%d-%B-%Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

lazy_static! {
    static ref NUMERIC_TRIPLE: Regex =
        Regex::new(r"^(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})$").unwrap();

    static ref EMBEDDED_DATE: Regex = Regex::new(
        r"\b(\d{4}-\d{2}-\d{2}|\d{1,2}[/-]\d{1,2}[/-]\d{2,4}|[A-Za-z]{3,9} \d{1,2}, \d{4}|\d{1,2} [A-Za-z]{3,9} \d{4})\b"
    )
    .unwrap();
}

/// Normalize a model-labeled ISO candidate, falling back to the raw
/// candidate. The "ISO" field is not trusted verbatim; it is simply
/// the more likely pre-normalized one, so it is tried first.
pub fn normalize_invoice_date(
    invoice_date_iso: Option<&str>,
    invoice_date_raw: Option<&str>,
) -> Option<String> {
    [invoice_date_iso, invoice_date_raw]
        .into_iter()
        .flatten()
        .find_map(normalize_date)
}

/// Parse a loosely-formatted date string into canonical `YYYY-MM-DD`.
pub fn normalize_date(value: &str) -> Option<String> {
    let text = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        return None;
    }

    for format in EXPLICIT_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&text, format) {
            return Some(date.format("%Y-%m-%d").to_string());
        }
    }

    if let Some(caps) = NUMERIC_TRIPLE.captures(&text) {
        // A matched triple that is not a valid calendar date is a
        // dead end, not a reason to keep searching.
        return resolve_numeric_triple(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        );
    }

    if let Some(embedded) = EMBEDDED_DATE.find(&text) {
        // Recurse only on a strictly shorter match: a full-width one
        // already failed the steps above and would loop forever.
        if embedded.as_str().len() < text.len() {
            return normalize_date(embedded.as_str());
        }
    }

    None
}

/// Disambiguate `A<sep>B<sep>Y`. Two-digit years below 70 are 20xx,
/// the rest 19xx. A component above 12 must be the day; when both fit
/// a month, month-first (US convention) wins. That last case is a
/// documented policy carried over from the source behavior, not a
/// guess at user intent.
fn resolve_numeric_triple(first: u32, second: u32, year: i32) -> Option<String> {
    let year = if year < 100 {
        if year < 70 { year + 2000 } else { year + 1900 }
    } else {
        year
    };

    let (month, day) = if first > 12 {
        (second, first)
    } else if second > 12 {
        (first, second)
    } else {
        (first, second)
    };

    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_date_handles_iso() {
        assert_eq!(normalize_date("2026-02-10").as_deref(), Some("2026-02-10"));
        assert_eq!(normalize_date("2026/02/10").as_deref(), Some("2026-02-10"));
        assert_eq!(normalize_date("2026.02.10").as_deref(), Some("2026-02-10"));
    }

    #[test]
    fn test_normalize_date_is_idempotent_on_iso() {
        let once = normalize_date("10 Feb 2026").unwrap();
        assert_eq!(normalize_date(&once), Some(once.clone()));
        assert_eq!(once, "2026-02-10");
    }

    #[test]
    fn test_normalize_date_handles_textual_formats() {
        assert_eq!(normalize_date("10 Feb 2026").as_deref(), Some("2026-02-10"));
        assert_eq!(
            normalize_date("10 February 2026").as_deref(),
            Some("2026-02-10")
        );
        assert_eq!(
            normalize_date("Feb 10, 2026").as_deref(),
            Some("2026-02-10")
        );
        assert_eq!(normalize_date("10-Feb-2026").as_deref(), Some("2026-02-10"));
    }

    #[test]
    fn test_normalize_date_collapses_whitespace() {
        assert_eq!(
            normalize_date("  10   Feb\n2026 ").as_deref(),
            Some("2026-02-10")
        );
    }

    #[test]
    fn test_ambiguous_numeric_defaults_to_month_first_policy() {
        // Both components fit a month; the documented policy picks
        // the US month-first reading.
        assert_eq!(normalize_date("02/10/2026").as_deref(), Some("2026-02-10"));
    }

    #[test]
    fn test_numeric_with_day_above_twelve_swaps_positionally() {
        assert_eq!(normalize_date("13/02/2026").as_deref(), Some("2026-02-13"));
        assert_eq!(normalize_date("02-13-2026").as_deref(), Some("2026-02-13"));
    }

    #[test]
    fn test_two_digit_year_pivots_at_seventy() {
        assert_eq!(normalize_date("1/2/69").as_deref(), Some("2069-01-02"));
        assert_eq!(normalize_date("1/2/70").as_deref(), Some("1970-01-02"));
    }

    #[test]
    fn test_invalid_calendar_date_yields_none() {
        assert_eq!(normalize_date("31/02/2026"), None);
        // Date-shaped but calendar-invalid strings also match the
        // embedded-date pattern at full width; they must terminate
        // with None, not re-parse themselves.
        assert_eq!(normalize_date("2026-02-30"), None);
        assert_eq!(normalize_date("Feb 30, 2026"), None);
        assert_eq!(normalize_date("30 February 2026"), None);
    }

    #[test]
    fn test_invalid_embedded_date_in_prose_yields_none() {
        assert_eq!(normalize_date("Invoice Date: 2026-02-30 (unpaid)"), None);
    }

    #[test]
    fn test_embedded_date_is_found_in_prose() {
        assert_eq!(
            normalize_date("Invoice Date: 2026-02-10 (paid)").as_deref(),
            Some("2026-02-10")
        );
        assert_eq!(
            normalize_date("issued 10 Feb 2026 in Warsaw").as_deref(),
            Some("2026-02-10")
        );
    }

    #[test]
    fn test_empty_and_garbage_yield_none() {
        assert_eq!(normalize_date(""), None);
        assert_eq!(normalize_date("   "), None);
        assert_eq!(normalize_date("no date here"), None);
    }

    #[test]
    fn test_normalize_invoice_date_prefers_iso_candidate() {
        assert_eq!(
            normalize_invoice_date(Some("2026-02-10"), Some("02/10/2026")).as_deref(),
            Some("2026-02-10")
        );
    }

    #[test]
    fn test_normalize_invoice_date_falls_back_to_raw() {
        assert_eq!(
            normalize_invoice_date(Some("not a date"), Some("10 Feb 2026")).as_deref(),
            Some("2026-02-10")
        );
        assert_eq!(normalize_invoice_date(None, None), None);
    }
}
