//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\mixcrate\config.toml
//! - macOS: ~/Library/Application Support/mixcrate/config.toml
//! - Linux: ~/.config/mixcrate/config.toml
//!
//! The config file is human-readable and editable. Blueprint files and run
//! output live under the configured data paths, not in the config dir.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API credentials (keep separate for potential future encryption)
    pub credentials: Credentials,

    /// Data and output directories
    pub paths: PathsConfig,

    /// Inter-request delays imposed on every provider interaction
    pub pacing: Pacing,

    /// Bounded-retry settings for the metadata provider
    pub retry: RetryConfig,

    /// HTTP API settings
    pub server: ServerConfig,
}

/// API credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// ListenBrainz user token for authenticated radio requests
    pub listenbrainz_token: Option<String>,
}

/// Filesystem layout for blueprints and run output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding one JSON file per blueprint
    pub blueprints: PathBuf,

    /// Output root; music, playlists, and reports live underneath
    pub output: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            blueprints: PathBuf::from("blueprints"),
            output: PathBuf::from("output"),
        }
    }
}

impl PathsConfig {
    /// Downloaded audio tree: `{output}/music/{artist}/{album}/...`
    pub fn music_dir(&self) -> PathBuf {
        self.output.join("music")
    }

    /// Playlist manifests: `{output}/playlists/{name}.m3u8`
    pub fn playlists_dir(&self) -> PathBuf {
        self.output.join("playlists")
    }

    /// Run reports: `{output}/reports/{name}-{timestamp}.json`
    pub fn reports_dir(&self) -> PathBuf {
        self.output.join("reports")
    }
}

/// Mandatory pacing between third-party calls, in seconds.
///
/// These are baseline throttle delays, not backoff: they apply on every
/// iteration regardless of success or failure. Zero everything with
/// [`Pacing::none`] in tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Pacing {
    /// Before each candidate's search call
    pub search_secs: u64,
    /// Before each search result's match evaluation
    pub result_secs: u64,
    /// Before each track's manifest fetch in the download loop
    pub track_secs: u64,
    /// Before fetching the audio bytes
    pub download_secs: u64,
    /// Before fetching the artwork bytes
    pub artwork_secs: u64,
    /// Before writing the audio file
    pub write_secs: u64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            search_secs: 4,
            result_secs: 4,
            track_secs: 10,
            download_secs: 5,
            artwork_secs: 5,
            write_secs: 2,
        }
    }
}

impl Pacing {
    /// Zero delays for tests.
    pub fn none() -> Self {
        Self {
            search_secs: 0,
            result_secs: 0,
            track_secs: 0,
            download_secs: 0,
            artwork_secs: 0,
            write_secs: 0,
        }
    }

    pub fn search(&self) -> Duration {
        Duration::from_secs(self.search_secs)
    }

    pub fn result(&self) -> Duration {
        Duration::from_secs(self.result_secs)
    }

    pub fn track(&self) -> Duration {
        Duration::from_secs(self.track_secs)
    }

    pub fn download(&self) -> Duration {
        Duration::from_secs(self.download_secs)
    }

    pub fn artwork(&self) -> Duration {
        Duration::from_secs(self.artwork_secs)
    }

    pub fn write(&self) -> Duration {
        Duration::from_secs(self.write_secs)
    }
}

/// Bounded retry for metadata-provider rate limiting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts for the candidate fetch (first try included)
    pub max_attempts: u32,

    /// Wait between attempts when the provider gave no hint, in seconds
    pub default_wait_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            default_wait_secs: 10,
        }
    }
}

/// HTTP API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address for `serve`
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8989".to_string(),
        }
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mixcrate"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from disk
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };

    if !path.exists() {
        tracing::info!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!("Failed to parse config file {:?}: {}", path, e);
                tracing::warn!("Using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file {:?}: {}", path, e);
            Config::default()
        }
    }
}

/// Save configuration to disk
///
/// Creates the config directory if it doesn't exist.
pub fn save(config: &Config) -> Result<(), ConfigError> {
    let dir = config_dir().ok_or(ConfigError::NoConfigDir)?;
    let path = dir.join("config.toml");

    // Ensure directory exists
    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::CreateDir(dir.clone(), e))?;

    // Serialize to pretty TOML
    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write atomically (write to temp, then rename)
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, &path)
        .map_err(|e| ConfigError::Rename(temp_path, path.clone(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[credentials]"));
        assert!(toml.contains("[paths]"));
        assert!(toml.contains("[pacing]"));
        assert!(toml.contains("[retry]"));
        assert!(toml.contains("[server]"));
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.credentials.listenbrainz_token = Some("test-token-123".to_string());
        config.pacing.search_secs = 1;
        config.paths.output = PathBuf::from("/srv/playlists");

        let toml = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();

        assert_eq!(
            parsed.credentials.listenbrainz_token,
            Some("test-token-123".to_string())
        );
        assert_eq!(parsed.pacing.search_secs, 1);
        assert_eq!(parsed.paths.output, PathBuf::from("/srv/playlists"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        // Config with only some fields
        let toml = r#"
[credentials]
listenbrainz_token = "my-token"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        // Specified field is set
        assert_eq!(
            config.credentials.listenbrainz_token,
            Some("my-token".to_string())
        );

        // Other fields use defaults
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.pacing.search_secs, 4);
        assert_eq!(config.server.bind, "127.0.0.1:8989");
    }

    #[test]
    fn test_output_subdirs() {
        let paths = PathsConfig::default();
        assert_eq!(paths.music_dir(), PathBuf::from("output/music"));
        assert_eq!(paths.playlists_dir(), PathBuf::from("output/playlists"));
        assert_eq!(paths.reports_dir(), PathBuf::from("output/reports"));
    }

    #[test]
    fn test_pacing_none_is_zero() {
        let pacing = Pacing::none();
        assert_eq!(pacing.search(), Duration::ZERO);
        assert_eq!(pacing.track(), Duration::ZERO);
    }
}
