//! Heuristic scoring of embedded text quality.
//!
//! Decides whether extracted text is good enough to skip the vision
//! fallback. Pure functions, no error conditions.

/// Invoice vocabulary counted as keyword hits.
pub const INVOICE_HINTS: [&str; 8] = [
    "invoice",
    "invoice date",
    "bill to",
    "total",
    "subtotal",
    "amount due",
    "due date",
    "tax",
];

/// Minimum score at which embedded text is considered usable.
pub const USABLE_TEXT_THRESHOLD: f64 = 0.45;

/// Score a block of extracted text in [0, 1].
///
/// Weighted sum of four independently normalized signals over the
/// trimmed text: length (0.45), printable-character ratio (0.20),
/// invoice keyword hits (0.25) and alphanumeric ratio (0.10).
pub fn score_text_quality(text: &str) -> f64 {
    let stripped = text.trim();
    if stripped.is_empty() {
        return 0.0;
    }

    let char_count = stripped.chars().count();
    let length_score = (char_count as f64 / 1500.0).min(1.0);

    let printable = stripped.chars().filter(|c| is_printable(*c)).count();
    let printable_ratio = printable as f64 / char_count as f64;

    let lowered = stripped.to_lowercase();
    let hits = INVOICE_HINTS
        .iter()
        .filter(|hint| lowered.contains(*hint))
        .count();
    let hint_score = (hits as f64 / 4.0).min(1.0);

    let alnum = stripped.chars().filter(|c| c.is_alphanumeric()).count();
    let alnum_ratio = alnum as f64 / char_count as f64;

    let score = 0.45 * length_score
        + 0.20 * printable_ratio
        + 0.25 * hint_score
        + 0.10 * alnum_ratio;
    score.clamp(0.0, 1.0)
}

/// Whether a score clears the usability threshold.
pub fn is_usable_text(quality_score: f64) -> bool {
    quality_score >= USABLE_TEXT_THRESHOLD
}

// The ASCII printable set plus the usual whitespace controls.
fn is_printable(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c.is_ascii_punctuation()
        || matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_text_scores_zero() {
        assert_eq!(score_text_quality(""), 0.0);
        assert_eq!(score_text_quality("   \n\t "), 0.0);
    }

    #[test]
    fn test_score_is_bounded() {
        let inputs = [
            "x",
            "invoice total subtotal tax amount due",
            &"a".repeat(5000),
            "\u{fffd}\u{fffd}\u{fffd}",
        ];
        for input in inputs {
            let score = score_text_quality(input);
            assert!((0.0..=1.0).contains(&score), "score out of range: {score}");
        }
    }

    #[test]
    fn test_invoice_like_text_clears_threshold() {
        let body = format!(
            "INVOICE\nInvoice Date: 2026-02-10\nBill To: ACME\n\
             Subtotal: 100.00\nTax: 23.00\nTotal: 123.00\nAmount Due: 123.00\n{}",
            "Kawa ziarnista 1kg. ".repeat(60)
        );
        let score = score_text_quality(&body);
        assert!(is_usable_text(score), "expected usable, got {score}");
    }

    #[test]
    fn test_short_garbage_stays_below_threshold() {
        let score = score_text_quality("lorem ipsum");
        assert!(!is_usable_text(score), "expected unusable, got {score}");
    }

    #[test]
    fn test_keyword_hits_move_the_score() {
        let without = score_text_quality("plain body text with nothing relevant");
        let with = score_text_quality("invoice total tax amount due and body text");
        assert!(with > without);
    }
}
