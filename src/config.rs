//! Configuration system using TOML files.
//!
//! Config lives in the OS-standard config directory:
//! - Windows: %APPDATA%\spinlog\config.toml
//! - macOS: ~/Library/Application Support/spinlog/config.toml
//! - Linux: ~/.config/spinlog/config.toml
//!
//! overridable with the `SPINLOG_CONFIG` environment variable. The database
//! and token cache live in the OS data directory (override: `SPINLOG_DATA`).
//!
//! The only required settings are the Spotify app credentials; a pull or
//! auth without them fails up front with [`missing_credentials_message`].

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Spotify app credentials
    pub spotify: SpotifyApp,

    /// Sync behavior
    pub sync: SyncConfig,
}

/// Credentials of the registered Spotify application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotifyApp {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

/// Sync behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Minimum delay between remote API calls, in milliseconds. Spotify's
    /// rate limit is undocumented; pacing stays under it.
    pub throttle_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { throttle_ms: 500 }
    }
}

impl Config {
    /// Both credentials, or `None` if either is missing.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.spotify.client_id, &self.spotify.client_secret) {
            (Some(id), Some(secret)) => Some((id, secret)),
            _ => None,
        }
    }

    /// The configured inter-call throttle.
    pub fn throttle_interval(&self) -> Duration {
        Duration::from_millis(self.sync.throttle_ms)
    }
}

// ============================================================================
// Paths
// ============================================================================

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("SPINLOG_CONFIG") {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|d| d.join("spinlog").join("config.toml"))
}

/// Get the data directory (database and token cache)
pub fn data_dir() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("SPINLOG_DATA") {
        return Some(PathBuf::from(path));
    }
    dirs::data_dir().map(|d| d.join("spinlog"))
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Load configuration from disk
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
/// Whether the credentials are actually present is the caller's check.
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

/// The message shown when a command needs credentials that aren't configured.
pub fn missing_credentials_message() -> String {
    let path = config_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "the config file".to_string());
    format!(
        "Invalid configuration. Please add your client_id and client_secret \
         in {path}:\n\n\
         [spotify]\n\
         client_id = \"your client ID\"\n\
         client_secret = \"your client secret\""
    )
}

// ============================================================================
// Tests
// ============================================================================
