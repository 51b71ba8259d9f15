//! mixcrate - scheduled playlist curation.
//!
//! Turns blueprint files (a radio prompt plus a schedule) into tagged audio
//! on disk, an M3U manifest, and a run report. Candidates come from a
//! recommendation feed, audio from a source catalog, with fuzzy matching
//! in between.

pub mod blueprint;
pub mod builder;
pub mod cli;
pub mod config;
pub mod error;
pub mod matching;
pub mod playlist;
pub mod providers;
pub mod report;
pub mod resolver;
pub mod runner;
pub mod scheduler;
pub mod server;
pub mod tagger;

use clap::{CommandFactory, Parser};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::from_default_env().add_directive("mixcrate=info".parse().unwrap()))
        .init();

    // Try to run a CLI command
    if cli::run_command(&args)? {
        return Ok(());
    }

    // No command specified
    cli::Cli::command().print_help()?;
    Ok(())
}
