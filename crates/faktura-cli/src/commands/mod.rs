//! CLI subcommands.

pub mod extract;
pub mod models;

/// Collapse a `--flag` / `--no-flag` pair into one override: set when
/// either side was given, unset so lower layers decide otherwise.
/// clap's `overrides_with` guarantees at most one side is on.
pub fn toggle(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}
