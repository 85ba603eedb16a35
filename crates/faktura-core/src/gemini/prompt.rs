//! Prompt construction for text and vision extraction.

/// Prompt for interpreting embedded invoice text.
pub fn build_text_prompt(locale: &str) -> String {
    build_prompt(
        "Extract invoice metadata from the provided invoice text.",
        locale,
    )
}

/// Prompt for interpreting rendered invoice page images.
pub fn build_vision_prompt(locale: &str) -> String {
    build_prompt(
        "Extract invoice metadata from the provided invoice page images (OCR and interpret).",
        locale,
    )
}

fn build_prompt(task_intro: &str, locale: &str) -> String {
    let language_rule = language_rule(locale);
    format!(
        r#"{task_intro}

Return JSON only with this schema:
{{
  "invoice_date_raw": string | null,
  "invoice_date_iso": string | null,
  "short_description": string,
  "confidence": number,
  "notes": string | null
}}

Rules:
- Prefer invoice issue date over due date or service date when present.
- If ambiguous, choose the best guess, lower confidence, and explain in notes.
- short_description must describe the purchased item/service, not the vendor, and be 5 words or fewer.
- If the item/service is unclear, use a generic but useful label.
- {language_rule}
"#
    )
}

fn language_rule(locale: &str) -> String {
    let normalized = locale.trim().to_lowercase();
    let normalized = if normalized.is_empty() { "pl" } else { &normalized };
    if normalized.starts_with("pl") {
        "Write short_description in Polish whenever possible (e.g., 'filtr', 'kawa').".to_string()
    } else if normalized.starts_with("en") {
        "Write short_description in English.".to_string()
    } else {
        format!("Write short_description in locale '{normalized}' whenever possible.")
    }
}
