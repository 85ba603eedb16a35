//! Models command - list Gemini models visible to the API key.

use std::path::Path;

use clap::Args;

use faktura_core::config::{Settings, SettingsOverrides};
use faktura_core::{GeminiClient, Result};

/// Arguments for the models command.
#[derive(Args)]
pub struct ModelsArgs {
    /// Include non-Gemini models in the listing
    #[arg(long)]
    all: bool,

    /// Keep only models whose name or display name contains this text
    #[arg(long)]
    filter: Option<String>,

    /// Pretty-print JSON output
    #[arg(long, overrides_with = "no_pretty")]
    pretty: bool,

    /// Force compact JSON output
    #[arg(long, overrides_with = "pretty")]
    no_pretty: bool,

    /// Gemini request timeout in seconds
    #[arg(long)]
    timeout_seconds: Option<u64>,
}

pub async fn run(args: ModelsArgs, config_path: Option<&str>) -> Result<()> {
    let overrides = SettingsOverrides {
        timeout_seconds: args.timeout_seconds,
        pretty: super::toggle(args.pretty, args.no_pretty),
        ..Default::default()
    };
    let settings = Settings::resolve(config_path.map(Path::new), &overrides)?;

    let client = GeminiClient::from_settings(&settings)?;
    let catalog = client.list_models(!args.all, args.filter.as_deref()).await?;

    let output = if settings.pretty {
        serde_json::to_string_pretty(&catalog)
    } else {
        serde_json::to_string(&catalog)
    }
    .map_err(|e| faktura_core::error::GeminiError::Json(e.to_string()))?;
    println!("{output}");
    Ok(())
}
