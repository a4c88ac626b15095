//! quire CLI - markdown render tree tool.
//!
//! Provides commands for:
//! - `render`: Render markdown (or a token tree) to a render tree
//! - `tokens`: Print the token tree of a markdown document
//! - `drafts`: Inspect and extend the autosave history

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{DraftsArgs, RenderArgs, TokensArgs};
use output::Output;

/// quire - markdown render tree tool.
#[derive(Parser)]
#[command(name = "quire", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a markdown document.
    Render(RenderArgs),
    /// Print the token tree of a markdown document.
    Tokens(TokensArgs),
    /// Draft autosave history.
    Drafts(DraftsArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = matches!(&cli.command, Commands::Render(args) if args.verbose);

    // --verbose enables INFO level, otherwise use RUST_LOG
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Render(args) => args.execute(),
        Commands::Tokens(args) => args.execute(),
        Commands::Drafts(args) => args.execute(&output),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
