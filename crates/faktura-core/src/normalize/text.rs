//! Sanitization of free-text descriptions into filename-safe tokens.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Sentinel used when no description survives sanitization.
pub const FALLBACK_DESCRIPTION: &str = "item";

/// Default word cap for short descriptions.
pub const MAX_DESCRIPTION_WORDS: usize = 5;

/// Sanitize a free-text description into at most `max_words`
/// lowercase ASCII tokens; never returns an empty string.
pub fn sanitize_short_description(value: Option<&str>, max_words: usize) -> String {
    let words = value.map(|v| sanitize_words(v, max_words)).unwrap_or_default();
    if words.is_empty() {
        FALLBACK_DESCRIPTION.to_string()
    } else {
        words.join(" ")
    }
}

/// The token list behind [`sanitize_short_description`], exposed so
/// callers can tell the `item` fallback apart from a real description.
pub fn sanitize_words(value: &str, max_words: usize) -> Vec<String> {
    let folded = ascii_fold(value).to_lowercase();
    let spaced: String = folded
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                ' '
            }
        })
        .collect();

    spaced
        .split_whitespace()
        .take(max_words)
        .map(str::to_string)
        .collect()
}

/// Count non-empty whitespace-separated tokens.
pub fn count_words(value: &str) -> usize {
    value.split_whitespace().count()
}

/// Polish letters are mapped explicitly before the generic NFKD pass:
/// `ł` carries no combining mark, so accent stripping alone would
/// leave it behind.
fn fold_polish(c: char) -> char {
    match c {
        'ą' => 'a',
        'ć' => 'c',
        'ę' => 'e',
        'ł' => 'l',
        'ń' => 'n',
        'ó' => 'o',
        'ś' => 's',
        'ź' | 'ż' => 'z',
        'Ą' => 'A',
        'Ć' => 'C',
        'Ę' => 'E',
        'Ł' => 'L',
        'Ń' => 'N',
        'Ó' => 'O',
        'Ś' => 'S',
        'Ź' | 'Ż' => 'Z',
        other => other,
    }
}

fn ascii_fold(value: &str) -> String {
    value
        .chars()
        .map(fold_polish)
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}
