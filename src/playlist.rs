//! M3U manifest reading and writing.
//!
//! Manifests use the extended M3U shape with a fixed two-line header:
//! `#EXTM3U` followed by `#{playlist name}`. Every later line is one track
//! path, relative to the playlists directory (`../music/...`), so the
//! output tree can be moved or mounted elsewhere without rewriting files.

use std::path::{Path, PathBuf};

use crate::error::{Result, ResultExt};

/// First line of every manifest
pub const HEADER: &str = "#EXTM3U";

/// A parsed playlist manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Playlist name from the second header line
    pub name: String,
    /// Track paths relative to the playlists directory
    pub entries: Vec<String>,
}

/// Path of the manifest for a playlist name.
pub fn manifest_path(playlists_dir: &Path, name: &str) -> PathBuf {
    playlists_dir.join(format!("{name}.m3u8"))
}

/// Write a manifest, replacing any previous file for this playlist.
///
/// The file is written in one shot after the run finishes, never appended
/// to incrementally, so a crashed run leaves the previous manifest intact.
pub fn write_manifest(playlists_dir: &Path, name: &str, entries: &[String]) -> Result<PathBuf> {
    std::fs::create_dir_all(playlists_dir)
        .with_context(format!("creating playlists dir {}", playlists_dir.display()))?;

    let mut contents = String::new();
    contents.push_str(HEADER);
    contents.push('\n');
    contents.push('#');
    contents.push_str(name);
    contents.push('\n');
    for entry in entries {
        contents.push_str(entry);
        contents.push('\n');
    }

    let path = manifest_path(playlists_dir, name);
    std::fs::write(&path, contents)
        .with_context(format!("writing manifest {}", path.display()))?;

    tracing::info!(path = %path.display(), tracks = entries.len(), "wrote playlist manifest");
    Ok(path)
}

/// Parse a manifest file back into name and entries.
pub fn read_manifest(path: &Path) -> Result<Manifest> {
    let contents = std::fs::read_to_string(path)
        .with_context(format!("reading manifest {}", path.display()))?;

    let mut lines = contents.lines();
    match lines.next() {
        Some(HEADER) => {}
        _ => {
            return Err(crate::error::Error::report(format!(
                "{}: missing {HEADER} header",
                path.display()
            )));
        }
    }
    let name = match lines.next() {
        Some(line) if line.starts_with('#') => line[1..].to_string(),
        _ => {
            return Err(crate::error::Error::report(format!(
                "{}: missing playlist name line",
                path.display()
            )));
        }
    };

    let entries = lines
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.to_string())
        .collect();

    Ok(Manifest { name, entries })
}
