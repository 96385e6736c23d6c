//! lume-resolve CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.global.verbose {
        EnvFilter::new("lume_resolve=debug")
    } else {
        EnvFilter::new("lume_resolve=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    match cli.command {
        Commands::Check(args) => commands::check::execute(args, &cli.global),
        Commands::Locate(args) => commands::locate::execute(args, &cli.global),
        Commands::Packages(args) => commands::packages::execute(args, &cli.global),
    }
}
