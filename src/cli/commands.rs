//! CLI command definitions and handlers.
//!
//! Each subcommand is implemented as a function that takes the parsed arguments
//! and returns an `anyhow::Result<()>`.

use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::runtime::Runtime;

use crate::blueprint;
use crate::config;
use crate::report;
use crate::runner::{self, RunGuard};
use crate::scheduler;
use crate::server;

/// mixcrate CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Build one playlist now
    Build {
        /// Blueprint name (the blueprints directory must hold a matching file)
        name: String,
    },
    /// Print the latest run report for a playlist
    Report {
        /// Playlist name
        name: String,
    },
    /// List all blueprints
    Blueprints,
    /// Run the HTTP API and the blueprint scheduler
    Serve {
        /// Listen address, overriding the configured one
        #[arg(short, long, env = "MIXCRATE_BIND")]
        bind: Option<String>,
    },
}

/// Run the specified CLI command.
///
/// Returns `Ok(true)` if a command was run, `Ok(false)` if no command was
/// specified.
pub fn run_command(cli: &Cli) -> anyhow::Result<bool> {
    let rt = Runtime::new()?;

    match &cli.command {
        Some(Commands::Build { name }) => {
            cmd_build(&rt, name)?;
            Ok(true)
        }
        Some(Commands::Report { name }) => {
            cmd_report(name)?;
            Ok(true)
        }
        Some(Commands::Blueprints) => {
            cmd_blueprints()?;
            Ok(true)
        }
        Some(Commands::Serve { bind }) => {
            cmd_serve(&rt, bind.as_deref())?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Build one playlist and print what happened.
fn cmd_build(rt: &Runtime, name: &str) -> anyhow::Result<()> {
    let config = config::load();
    let blueprint = blueprint::find_by_name(&config.paths.blueprints, name)?;
    let guard = RunGuard::new();

    println!("Building playlist '{name}'...");
    let outcome = rt.block_on(runner::run_blueprint(&config, &guard, &blueprint))?;

    println!(
        "\nDone: {} track(s) in {}",
        outcome.entries.len(),
        outcome.manifest_path.display()
    );
    if !outcome.failures.is_empty() {
        println!("\n{} candidate(s) lost:", outcome.failures.len());
        for failure in &outcome.failures {
            println!(
                "  [{}] {} - {} ({})",
                failure.stage, failure.candidate.artist, failure.candidate.title, failure.detail
            );
        }
    }
    Ok(())
}

/// Print the latest report for a playlist as JSON.
fn cmd_report(name: &str) -> anyhow::Result<()> {
    let config = config::load();
    match report::latest(&config.paths, name)? {
        Some(run_report) => {
            println!("{}", serde_json::to_string_pretty(&run_report)?);
        }
        None => {
            println!("No report found for '{name}'");
        }
    }
    Ok(())
}

/// List blueprints with their schedule, if any.
fn cmd_blueprints() -> anyhow::Result<()> {
    let config = config::load();
    let blueprints = blueprint::load_dir(&config.paths.blueprints);

    if blueprints.is_empty() {
        println!(
            "No blueprints found in {}",
            config.paths.blueprints.display()
        );
        return Ok(());
    }

    println!("Found {} blueprint(s):\n", blueprints.len());
    for bp in &blueprints {
        let schedule = match scheduler::Cadence::from_blueprint(bp) {
            Some(cadence) => format!("{cadence:?}"),
            None => "on demand".to_string(),
        };
        let state = if bp.enabled { "" } else { " (disabled)" };
        println!(
            "  {}{state}\n    providers: {} / {}\n    prompt: {} [{}], {} tracks\n    schedule: {schedule}",
            bp.name, bp.meta_api, bp.audio_api, bp.prompt, bp.mode, bp.quantity
        );
    }
    Ok(())
}

/// HTTP API plus scheduler, both on the same runtime, until ctrl-c.
fn cmd_serve(rt: &Runtime, bind: Option<&str>) -> anyhow::Result<()> {
    let mut config = config::load();
    if let Some(bind) = bind {
        config.server.bind = bind.to_string();
    }
    let config = Arc::new(config);
    let guard = RunGuard::new();

    rt.block_on(async {
        tokio::spawn(scheduler::run(Arc::clone(&config), guard.clone()));
        server::run(config, guard).await
    })
}
