//! Blueprint store: saved playlist-build configurations.
//!
//! One JSON file per blueprint in the blueprints directory. Field names stay
//! camelCase on disk for compatibility with existing blueprint files and the
//! web UI that edits them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// A saved playlist-build configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blueprint {
    /// Playlist name; also the manifest name and the scheduler job id
    pub name: String,
    /// Metadata provider selector ("lbz")
    pub meta_api: String,
    /// Audio provider selector ("hifi")
    pub audio_api: String,
    /// Radio prompt handed to the metadata provider
    pub prompt: String,
    /// Prompt mode ("easy", "medium", "hard")
    #[serde(default = "default_mode")]
    pub mode: String,
    /// Target track count; resolution stops once this many tracks resolve
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Disabled blueprints are skipped by the scheduler
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    // Schedule fields ("weekly" uses weekday/hour/minute, "monthly" uses
    // day/month/hour). Absent fields fall back to the cadence defaults.
    #[serde(default)]
    pub every: Option<String>,
    #[serde(default)]
    pub weekday: Option<u32>,
    #[serde(default)]
    pub day: Option<u32>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub hour: Option<u32>,
    #[serde(default)]
    pub minute: Option<u32>,
}

fn default_mode() -> String {
    "easy".to_string()
}

fn default_quantity() -> u32 {
    10
}

fn default_enabled() -> bool {
    true
}

impl Blueprint {
    /// Parse a single blueprint file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let blueprint: Blueprint = serde_json::from_str(&contents)
            .map_err(|e| Error::blueprint(format!("{}: {e}", path.display())))?;
        if blueprint.name.trim().is_empty() {
            return Err(Error::blueprint(format!(
                "{}: blueprint name is empty",
                path.display()
            )));
        }
        Ok(blueprint)
    }

    #[cfg(test)]
    pub fn stub(name: &str) -> Self {
        Self {
            name: name.to_string(),
            meta_api: "lbz".to_string(),
            audio_api: "hifi".to_string(),
            prompt: "artist:(test)".to_string(),
            mode: "easy".to_string(),
            quantity: 10,
            enabled: true,
            every: None,
            weekday: None,
            day: None,
            month: None,
            hour: None,
            minute: None,
        }
    }
}

/// Load every blueprint in the top level of `dir`.
///
/// Malformed files are logged and skipped rather than failing the whole
/// listing; a single bad blueprint should not take down the scheduler.
pub fn load_dir(dir: &Path) -> Vec<Blueprint> {
    let mut blueprints = Vec::new();
    for entry in walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        tracing::debug!(file = %entry.path().display(), "found blueprint file");
        match Blueprint::load(entry.path()) {
            Ok(bp) => blueprints.push(bp),
            Err(e) => tracing::error!(file = %entry.path().display(), error = %e, "skipping malformed blueprint"),
        }
    }
    blueprints
}

/// Find the blueprint named `name`, scanning the blueprints directory.
pub fn find_by_name(dir: &Path, name: &str) -> Result<Blueprint> {
    load_dir(dir)
        .into_iter()
        .find(|bp| bp.name == name)
        .ok_or_else(|| Error::blueprint(format!("no blueprint found for {name}")))
}

/// Path a new blueprint would be stored at.
pub fn file_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.json"))
}
