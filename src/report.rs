//! Run reports: a verification pass over what is actually on disk.
//!
//! A report is generated after a run by re-reading the manifest and the
//! tagged files it points at, never from in-memory run state. If the
//! manifest, the files, and the report disagree, the report is the one
//! telling the truth about the output tree.
//!
//! Reports are JSON files under the reports directory, one per run, named
//! `{name}-{timestamp}.json` so the newest sorts last.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::blueprint::Blueprint;
use crate::config::PathsConfig;
use crate::error::{Error, Result, ResultExt};
use crate::playlist;
use crate::tagger::{self, TagSummary};

/// Timestamp format used both inside the report and in its filename.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// One run's report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub name: String,
    /// Generation time; key name kept for compatibility with existing
    /// report consumers
    #[serde(rename = "runnedAt")]
    pub runned_at: String,
    /// Snapshot of the blueprint that produced the run
    pub blueprint: Blueprint,
    pub tracklist: Vec<TagSummary>,
}

/// Generate a report for a blueprint by re-reading its manifest from disk.
///
/// Scans the playlists directory for a manifest whose name line mentions
/// the blueprint, then reads tags back from every file the manifest lists.
/// Returns `None` when no manifest matches or the matching manifest lists
/// no tracks.
pub fn generate(paths: &PathsConfig, blueprint: &Blueprint) -> Result<Option<RunReport>> {
    let playlists_dir = paths.playlists_dir();
    if !playlists_dir.exists() {
        return Ok(None);
    }

    let mut manifest = None;
    for entry in walkdir::WalkDir::new(&playlists_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        match playlist::read_manifest(entry.path()) {
            Ok(m) if m.name.contains(&blueprint.name) => {
                manifest = Some(m);
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(file = %entry.path().display(), error = %e, "unreadable manifest");
            }
        }
    }

    let Some(manifest) = manifest else {
        tracing::info!(playlist = %blueprint.name, "no manifest found, skipping report");
        return Ok(None);
    };
    if manifest.entries.is_empty() {
        tracing::info!(playlist = %blueprint.name, "manifest is empty, skipping report");
        return Ok(None);
    }

    let tracklist = manifest
        .entries
        .iter()
        .map(|entry| {
            // Manifest entries are relative to the playlists directory;
            // strip the leading "../" to get the output-root path
            let relative = entry.strip_prefix("../").unwrap_or(entry);
            tagger::read_summary(&paths.output.join(relative), relative)
        })
        .collect();

    Ok(Some(RunReport {
        name: blueprint.name.clone(),
        runned_at: chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string(),
        blueprint: blueprint.clone(),
        tracklist,
    }))
}

/// Write a report to the reports directory, one file per run.
pub fn write(paths: &PathsConfig, report: &RunReport) -> Result<PathBuf> {
    let dir = paths.reports_dir();
    std::fs::create_dir_all(&dir)
        .with_context(format!("creating reports dir {}", dir.display()))?;

    let stamp = chrono::Utc::now().format(FILE_TIMESTAMP_FORMAT);
    let path = dir.join(format!("{}-{stamp}.json", report.name));

    let contents = serde_json::to_string_pretty(report)
        .map_err(|e| Error::report(format!("serializing report: {e}")))?;
    std::fs::write(&path, contents)
        .with_context(format!("writing report {}", path.display()))?;

    tracing::info!(path = %path.display(), tracks = report.tracklist.len(), "wrote run report");
    Ok(path)
}

/// Load the most recent report for a playlist name, if any run has one.
///
/// File timestamps sort lexicographically, so the newest report is simply
/// the largest matching filename.
pub fn latest(paths: &PathsConfig, name: &str) -> Result<Option<RunReport>> {
    let dir = paths.reports_dir();
    if !dir.exists() {
        return Ok(None);
    }

    let prefix = format!("{name}-");
    let newest = walkdir::WalkDir::new(&dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.file_name()
                .to_str()
                .is_some_and(|n| n.starts_with(&prefix) && n.ends_with(".json"))
        })
        .max_by(|a, b| a.file_name().cmp(b.file_name()));

    let Some(entry) = newest else {
        return Ok(None);
    };

    let contents = std::fs::read_to_string(entry.path())
        .with_context(format!("reading report {}", entry.path().display()))?;
    let report = serde_json::from_str(&contents)
        .map_err(|e| Error::report(format!("{}: {e}", entry.path().display())))?;
    Ok(Some(report))
}
