//! TOML-based application configuration.
//!
//! Per-project settings (cadence, metadata defaults) live in the project
//! documents; this file holds the handful of machine-wide knobs.
//!
//! Stored at `<data dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::StorageError;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// File extensions treated as candidate videos during scans.
    #[serde(default = "default_extensions")]
    pub video_extensions: Vec<String>,
    /// Seconds to wait between uploads to reduce rate-limit pressure.
    #[serde(default = "default_throttle")]
    pub throttle_seconds: f64,
    /// Localhost port the OAuth callback listener binds to.
    #[serde(default = "default_oauth_port")]
    pub oauth_redirect_port: u16,
}

fn default_extensions() -> Vec<String> {
    ["mp4", "mov", "mkv", "webm"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_throttle() -> f64 {
    1.0
}
fn default_oauth_port() -> u16 {
    17653
}

impl Default for Config {
    fn default() -> Self {
        Self {
            video_extensions: default_extensions(),
            throttle_seconds: default_throttle(),
            oauth_redirect_port: default_oauth_port(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, StorageError> {
        Ok(super::data_dir()?.join("config.toml"))
    }

    /// Load from disk or write and return the default.
    pub fn load() -> Result<Self, StorageError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                toml::from_str(&content).map_err(|e| StorageError::ConfigParse(e.to_string()))
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), StorageError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self)
            .map_err(|e| StorageError::ConfigParse(e.to_string()))?;
        std::fs::write(&path, content).map_err(|source| StorageError::Io { path, source })
    }

    /// Load from disk, returning the default on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.video_extensions, cfg.video_extensions);
        assert_eq!(parsed.throttle_seconds, 1.0);
        assert_eq!(parsed.oauth_redirect_port, 17653);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let parsed: Config = toml::from_str("throttle_seconds = 2.5\n").unwrap();
        assert_eq!(parsed.throttle_seconds, 2.5);
        assert_eq!(parsed.video_extensions, Config::default().video_extensions);
    }
}
