//! Run orchestration: providers, build, report, and the one-run-per-name
//! guard.
//!
//! A blueprint can have at most one run in flight at a time. The guard is a
//! shared name set; acquiring returns a permit whose `Drop` releases the
//! name, so a panicking run still frees its slot.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::blueprint::Blueprint;
use crate::builder::{PlaylistBuilder, RunOutcome};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::providers;
use crate::report;

/// Names of blueprints currently running, shared across tasks.
#[derive(Debug, Clone, Default)]
pub struct RunGuard {
    running: Arc<Mutex<HashSet<String>>>,
}

/// Held for the duration of one run; releases the name on drop.
pub struct RunPermit {
    name: String,
    running: Arc<Mutex<HashSet<String>>>,
}

impl RunGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to claim a run slot for `name`. `None` means a run is already
    /// in flight.
    pub fn try_acquire(&self, name: &str) -> Option<RunPermit> {
        let mut running = self.running.lock().expect("run guard poisoned");
        if !running.insert(name.to_string()) {
            return None;
        }
        Some(RunPermit {
            name: name.to_string(),
            running: Arc::clone(&self.running),
        })
    }

    /// Whether a run for `name` is currently in flight.
    pub fn is_running(&self, name: &str) -> bool {
        self.running
            .lock()
            .expect("run guard poisoned")
            .contains(name)
    }
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        self.running
            .lock()
            .expect("run guard poisoned")
            .remove(&self.name);
    }
}

/// Execute one blueprint end to end: build, then report.
///
/// Returns `AlreadyRunning` without doing any work when the guard refuses
/// a permit.
pub async fn run_blueprint(
    config: &Config,
    guard: &RunGuard,
    blueprint: &Blueprint,
) -> Result<RunOutcome> {
    let Some(_permit) = guard.try_acquire(&blueprint.name) else {
        return Err(Error::blueprint(format!(
            "a run for {} is already in flight",
            blueprint.name
        )));
    };

    let span = tracing::info_span!("run", playlist = %blueprint.name);
    let _enter = span.enter();

    let metadata = providers::metadata_provider(
        &blueprint.meta_api,
        config.credentials.listenbrainz_token.as_deref(),
    )?;
    let source = providers::audio_provider(&blueprint.audio_api)?;

    let builder = PlaylistBuilder::new(
        metadata.as_ref(),
        source.as_ref(),
        config.paths.clone(),
        config.pacing.clone(),
        config.retry.clone(),
    );
    let outcome = builder.build(blueprint).await?;

    for failure in &outcome.failures {
        tracing::warn!(
            stage = %failure.stage,
            title = %failure.candidate.title,
            artist = %failure.candidate.artist,
            detail = %failure.detail,
            "candidate lost"
        );
    }

    match report::generate(&config.paths, blueprint)? {
        Some(run_report) => {
            report::write(&config.paths, &run_report)?;
        }
        None => {
            tracing::info!(playlist = %blueprint.name, "run produced no tracks, no report written");
        }
    }

    Ok(outcome)
}
