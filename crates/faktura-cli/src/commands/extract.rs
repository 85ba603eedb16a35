//! Extract command - process a single invoice PDF.

use std::path::{Path, PathBuf};

use clap::Args;
use console::style;
use tracing::{info, warn};

use faktura_core::config::{Settings, SettingsOverrides};
use faktura_core::pdf::validate_input_pdf_path;
use faktura_core::{ExtractionPipeline, ExtractionResult, Result};

use super::toggle;

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Path to the invoice PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Gemini model name
    #[arg(short, long)]
    model: Option<String>,

    /// Preferred language for the short description (default: pl)
    #[arg(short, long)]
    locale: Option<String>,

    /// Maximum number of pages to inspect
    #[arg(long)]
    max_pages: Option<usize>,

    /// Extraction mode: auto (text first) or gemini (vision only)
    #[arg(long)]
    ocr_mode: Option<String>,

    /// Gemini request timeout in seconds
    #[arg(long)]
    timeout_seconds: Option<u64>,

    /// Token placed between date and description in the filename stub
    #[arg(long)]
    filename_separator: Option<String>,

    /// Suffix appended to the filename stub
    #[arg(long)]
    filename_suffix: Option<String>,

    /// Token used between date components in the filename stub
    #[arg(long)]
    filename_date_separator: Option<String>,

    /// Pretty-print JSON output
    #[arg(long, overrides_with = "no_pretty")]
    pretty: bool,

    /// Force compact JSON output
    #[arg(long, overrides_with = "pretty")]
    no_pretty: bool,

    /// Rename the PDF to the composed filename stub
    #[arg(long, overrides_with = "no_rename")]
    rename: bool,

    /// Leave the PDF in place even when a rename is configured
    #[arg(long, overrides_with = "rename")]
    no_rename: bool,

    /// Report the rename without performing it
    #[arg(long, overrides_with = "no_dry_run")]
    dry_run: bool,

    /// Perform the rename even when a dry run is configured
    #[arg(long, overrides_with = "dry_run")]
    no_dry_run: bool,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> Result<()> {
    let overrides = SettingsOverrides {
        model: args.model.clone(),
        locale: args.locale.clone(),
        max_pages: args.max_pages,
        ocr_mode: args.ocr_mode.clone(),
        timeout_seconds: args.timeout_seconds,
        filename_separator: args.filename_separator.clone(),
        filename_suffix: args.filename_suffix.clone(),
        filename_date_separator: args.filename_date_separator.clone(),
        pretty: toggle(args.pretty, args.no_pretty),
        rename: toggle(args.rename, args.no_rename),
        dry_run: toggle(args.dry_run, args.no_dry_run),
        ..Default::default()
    };
    let settings = Settings::resolve(config_path.map(Path::new), &overrides)?;
    if let Some(path) = &settings.config_path {
        info!("loaded config from {}", path.display());
    }

    // Path problems are reported before any client is built, so a
    // bad path never surfaces as an API error.
    validate_input_pdf_path(&args.input)?;

    let pipeline = ExtractionPipeline::from_settings(&settings)?;
    let result = pipeline.run(&args.input).await?;

    let output = if settings.pretty {
        serde_json::to_string_pretty(&result)
    } else {
        serde_json::to_string(&result)
    }
    .map_err(|e| std::io::Error::other(e.to_string()))?;
    println!("{output}");

    if settings.rename || settings.dry_run {
        apply_rename(&args.input, &result, settings.dry_run)?;
    }
    Ok(())
}

/// Rename the source PDF to `<filename_stub>.pdf` next to it. Never
/// overwrites an existing file.
fn apply_rename(input: &Path, result: &ExtractionResult, dry_run: bool) -> Result<()> {
    let target = input.with_file_name(format!("{}.pdf", result.filename_stub));

    if target == input {
        info!("file already has the composed name, nothing to do");
        return Ok(());
    }
    if target.exists() {
        warn!("rename target already exists: {}", target.display());
        eprintln!(
            "{} Rename skipped, target exists: {}",
            style("!").yellow(),
            target.display()
        );
        return Ok(());
    }

    if dry_run {
        eprintln!(
            "{} Would rename {} -> {}",
            style("ℹ").blue(),
            input.display(),
            target.display()
        );
        return Ok(());
    }

    std::fs::rename(input, &target)?;
    eprintln!(
        "{} Renamed to {}",
        style("✓").green(),
        target.display()
    );
    Ok(())
}
