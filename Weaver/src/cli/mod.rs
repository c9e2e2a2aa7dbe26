//! Weaver CLI
//!
//! `import` runs a full import from a preferences file; `boards`, `components`
//! and `transpile` inspect a project while writing those preferences.

pub mod commands;
pub mod progress;

use clap::Parser;
use commands::Commands;
use tracing::Level;

#[derive(Parser)]
#[command(name = "weaver")]
#[command(
    version,
    about = "Import Arcweave boards into a dialogue database",
    long_about = "Converts the leaf boards of an Arcweave project into conversations of linked \
                  dialogue entries, with branch guards and scripts translated for the dialogue runtime."
)]
struct Cli {
    /// Log import passes (-v) or every resolved link (-vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Run the Weaver CLI
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    cli.command.execute()
}
