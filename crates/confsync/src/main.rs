//! confsync CLI - Sync a markdown documentation tree to Confluence.
//!
//! Provides commands for:
//! - `render`: Print the storage format of one markdown file
//! - `status`: List documents that changed since the last sync
//! - `sync`: Publish changed documents and save the sync state

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{GlobalArgs, RenderArgs, StatusArgs, SyncArgs};
use output::Output;

/// confsync - Markdown to Confluence sync.
#[derive(Parser)]
#[command(name = "confsync", version, about)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a markdown file to Confluence storage format.
    Render(RenderArgs),
    /// Show documents that would be published.
    Status(StatusArgs),
    /// Publish changed documents.
    Sync(SyncArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.global.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Render(args) => args.execute(&cli.global),
        Commands::Status(args) => args.execute(&cli.global),
        Commands::Sync(args) => args.execute(&cli.global),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
