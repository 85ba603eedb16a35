//! CLI for invoice PDF date/description extraction.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use faktura_core::error::FakturaError;
use faktura_core::Result;

use commands::{extract, models};

/// Extract an invoice date and short purchase description from a PDF
#[derive(Parser)]
#[command(name = "faktura")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract metadata from a single invoice PDF
    Extract(extract::ExtractArgs),

    /// List Gemini models available to the configured API key
    Models(models::ModelsArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Set up logging based on verbosity; diagnostics go to stderr so
    // stdout stays machine-readable JSON.
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let outcome: Result<()> = match cli.command {
        Commands::Extract(args) => extract::run(args, cli.config.as_deref()).await,
        Commands::Models(args) => models::run(args, cli.config.as_deref()).await,
    };

    if let Err(err) = outcome {
        let code = exit_code(&err);
        let payload = serde_json::json!({
            "error": err.to_string(),
            "exit_code": code,
        });
        eprintln!("{payload}");
        std::process::exit(code);
    }
}

/// Stable exit codes per failure kind, for scripting around the CLI.
fn exit_code(err: &FakturaError) -> i32 {
    match err {
        FakturaError::Input(_) | FakturaError::Config(_) => 2,
        FakturaError::Pdf(_) => 3,
        FakturaError::Gemini(_) => 4,
        FakturaError::Io(_) => 10,
    }
}
