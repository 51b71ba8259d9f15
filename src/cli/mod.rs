//! Command-line interface for mixcrate.
//!
//! This module provides CLI commands for building playlists, inspecting
//! blueprints and reports, and running the HTTP API with the scheduler.

mod commands;

pub use commands::{Cli, Commands, run_command};
