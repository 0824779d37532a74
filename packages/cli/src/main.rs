mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{init, simulate, snapshot, InitArgs, SimulateArgs, SnapshotArgs};

/// Folio CLI - Replay and inspect block drag-and-drop
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default folio.config.json
    Init(InitArgs),

    /// Replay a drag scenario and print the resulting documents
    Simulate(SimulateArgs),

    /// Print the snapshot of blocks in a document
    Snapshot(SnapshotArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match std::env::current_dir() {
        Ok(cwd) => match cli.command {
            Command::Init(args) => init(args, &cwd),
            Command::Simulate(args) => simulate(args, &cwd).await,
            Command::Snapshot(args) => snapshot(args, &cwd),
        },
        Err(err) => Err(anyhow::anyhow!("Cannot get current directory: {}", err)),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
