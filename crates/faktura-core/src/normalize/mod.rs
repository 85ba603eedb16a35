//! Normalization of model-reported fields into canonical forms.

pub mod dates;
pub mod filename;
pub mod text;

pub use dates::{normalize_date, normalize_invoice_date};
pub use filename::{FilenameOptions, compose_filename_stub, make_filename_stub, FALLBACK_DATE};
pub use text::{count_words, sanitize_short_description, sanitize_words, FALLBACK_DESCRIPTION};
