//! OverlayKit CLI - Command-line interface for overlay files

pub mod commands;

use clap::Parser;
use commands::Commands;

#[derive(Parser)]
#[command(name = "overlaykit")]
#[command(about = "OverlayKit: container and tile overlay file tools", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Run the OverlayKit CLI
pub fn run_cli() -> anyhow::Result<()> {
    // Setup logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    cli.command.execute()?;

    Ok(())
}
