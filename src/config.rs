//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\musicflow-catalog\config.toml
//! - macOS: ~/Library/Application Support/musicflow-catalog/config.toml
//! - Linux: ~/.config/musicflow-catalog/config.toml
//!
//! Every field has a default, so a partial file (or no file at all) is
//! always usable. Command line flags override what is loaded here.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cover::VariantSpec;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,

    /// Where the music lives and how paths are interpreted
    pub library: LibraryConfig,

    /// Track ingestion settings
    pub import: ImportConfig,

    /// Cover derivation settings
    pub covers: CoverConfig,
}

/// Database location
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file (empty = `musicflow.db` in the working directory)
    pub path: Option<PathBuf>,
}

/// Library layout settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Music root; `file_url` and inferred tags are relative to it
    pub root: PathBuf,

    /// Audio file extensions to import (lowercase, without dot)
    pub extensions: Vec<String>,

    /// Directory names never turned into tags (compared case-insensitively)
    pub tag_denylist: Vec<String>,

    /// Colors given to newly created tags
    pub tag_color: String,
    pub tag_text_color: String,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("music"),
            extensions: ["mp3", "flac", "m4a", "ape", "wav", "ogg"]
                .into_iter()
                .map(String::from)
                .collect(),
            tag_denylist: ["", ".", "..", "music", "mp3", "flac", "node_modules"]
                .into_iter()
                .map(String::from)
                .collect(),
            tag_color: "#000000".to_string(),
            tag_text_color: "#FFFFFF".to_string(),
        }
    }
}

/// Track ingestion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Files processed concurrently per chunk
    pub chunk_size: usize,

    /// Per-file timeout in seconds (0 = no timeout)
    pub task_timeout_secs: u64,

    /// Length of generated track ids
    pub id_length: usize,

    /// Attempts at minting a free track id before giving up
    pub id_attempts: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            chunk_size: 50,
            task_timeout_secs: 0,
            id_length: 9,
            id_attempts: 10,
        }
    }
}

impl ImportConfig {
    pub fn task_timeout(&self) -> Option<Duration> {
        timeout_from_secs(self.task_timeout_secs)
    }
}

/// Cover derivation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverConfig {
    /// Albums processed concurrently per chunk
    pub chunk_size: usize,

    /// Per-album timeout in seconds (0 = no timeout)
    pub task_timeout_secs: u64,

    /// Variants produced for every cover
    pub variants: Vec<VariantSpec>,
}

impl Default for CoverConfig {
    fn default() -> Self {
        Self {
            chunk_size: 50,
            task_timeout_secs: 0,
            variants: VariantSpec::defaults(),
        }
    }
}

impl CoverConfig {
    pub fn task_timeout(&self) -> Option<Duration> {
        timeout_from_secs(self.task_timeout_secs)
    }
}

fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("musicflow-catalog"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from the default location.
///
/// Returns default config if the file doesn't exist or can't be parsed.
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

    match load_from(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            tracing::warn!("Using default configuration");
            Config::default()
        }
    }
}

/// Load configuration from an explicit path.
///
/// Unlike [`load`], a missing or malformed file is an error: the user asked
/// for this file specifically.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
    let config =
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
    tracing::info!("Loaded config from {:?}", path);
    Ok(config)
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("Failed to parse config file {0}: {1}")]
    Parse(PathBuf, toml::de::Error),
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
        assert!(toml.contains("[library]"));
        assert!(toml.contains("[import]"));
        assert!(toml.contains("[covers]"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
[library]
root = "/srv/music"

[import]
chunk_size = 10
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.library.root, PathBuf::from("/srv/music"));
        assert_eq!(config.import.chunk_size, 10);

        // Other fields use defaults
        assert_eq!(config.import.id_attempts, 10);
        assert_eq!(config.import.id_length, 9);
        assert!(config.library.tag_denylist.contains(&"flac".to_string()));
        assert_eq!(config.covers.variants.len(), 2);
        assert!(config.database.path.is_none());
    }

    #[test]
    fn test_custom_variants() {
        let toml = r#"
[covers]
variants = [{ name = "tiny", width = 32, height = 32, quality = 80 }]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.covers.variants.len(), 1);
        assert_eq!(config.covers.variants[0].name, "tiny");
    }

    #[test]
    fn test_zero_timeout_means_none() {
        let mut import = ImportConfig::default();
        assert!(import.task_timeout().is_none());
        import.task_timeout_secs = 30;
        assert_eq!(import.task_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_load_from_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_from(&dir.path().join("nope.toml"));
        assert!(matches!(result, Err(ConfigError::Read(_, _))));
    }

    #[test]
    fn test_load_from_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[import\nchunk_size = ").unwrap();
        assert!(matches!(load_from(&path), Err(ConfigError::Parse(_, _))));
    }
}
