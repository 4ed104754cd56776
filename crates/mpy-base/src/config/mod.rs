//! YAML configuration: embedded defaults overlaid with an optional user file
//! and environment overrides.
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use thiserror::Error;
use tracing::debug;

pub mod constants;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("cannot parse {path}: {source}")]
    Yaml { path: PathBuf, source: serde_yaml::Error },
    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

// ============================================================================
// Configuration types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub poll_interval_ms: u64,
    pub input_slice_ms: u64,
    pub status_cycles: u32,
    pub ratings: bool,
    pub seek_step_percent: u32,
    pub lyrics: LyricsConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LyricsConfig {
    pub dir: String,
    pub autosave_min_lines: usize,
    pub fetch: bool,
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub file: String,
    pub filter: String,
}

// ============================================================================
// Embedded defaults
// ============================================================================

fn parse_yaml<T: for<'de> Deserialize<'de>>(name: &str, content: &str) -> T {
    serde_yaml::from_str(content).unwrap_or_else(|e| panic!("Failed to parse {}: {}", name, e))
}

pub static DEFAULTS: LazyLock<Config> =
    LazyLock::new(|| parse_yaml("config.yaml", include_str!("../../../../yamls/config.yaml")));

impl Default for Config {
    fn default() -> Self {
        DEFAULTS.clone()
    }
}

// ============================================================================
// Loading
// ============================================================================

impl Config {
    /// Load `path`, or the per-user file if it exists, on top of the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (expand_home(constants::USER_CONFIG), false),
        };
        if !required && !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io { path: path.clone(), source })?;
        debug!(path = %path.display(), "loading config");
        Self::from_overlay(&content).map_err(|source| ConfigError::Yaml { path, source })
    }

    /// Defaults with the keys present in `yaml` replaced.
    pub fn from_overlay(yaml: &str) -> Result<Self, serde_yaml::Error> {
        let mut base = serde_yaml::to_value(&*DEFAULTS)?;
        let overlay: Value = serde_yaml::from_str(yaml)?;
        merge(&mut base, overlay);
        serde_yaml::from_value(base)
    }

    /// Apply `MPD_HOST` / `MPD_PORT` through `lookup` (normally `std::env::var`).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(host) = lookup("MPD_HOST")
            && !host.is_empty()
        {
            self.server.host = host;
        }
        if let Some(port) = lookup("MPD_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::Invalid { key: "MPD_PORT", reason: format!("{:?} is not a port", port) })?;
        }
        Ok(())
    }

    pub fn lyrics_dir(&self) -> PathBuf {
        expand_home(&self.lyrics.dir)
    }

    pub fn log_file(&self) -> PathBuf {
        expand_home(&self.log.file)
    }
}

fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, Value::Null) if !slot.is_mapping() => *slot = Value::Null,
        (_, Value::Null) => {}
        (slot, value) => *slot = value,
    }
}

/// Expand a leading `~/` using `$HOME`.
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(rest)
        }
        None => PathBuf::from(path),
    }
}
