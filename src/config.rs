//! Configuration for genealogy views
//!
//! Stored in `<config_dir>/genealogy/config.json`. Environment variables
//! override the file; command-line flags override both.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default depth limit for expansion and rendering
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Default indexer base URL
pub const DEFAULT_API_URL: &str = "https://api.genealogy.local";

/// Runtime configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Deepest level that is rendered; nodes on it are never expanded
    pub max_depth: usize,
    /// Base URL of the HTTP indexer
    pub api_url: String,
    /// HTTP client timeout in seconds
    pub timeout_secs: u64,
    /// Fixture document used by the fixture source
    pub fixture: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_depth: DEFAULT_MAX_DEPTH,
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: 30,
            fixture: None,
        }
    }
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not find config directory".into()))?;
        Ok(dir.join("genealogy").join("config.json"))
    }

    /// Load a config file, or defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load from the default location, then apply environment overrides
    ///
    /// Recognised variables: `GENEALOGY_MAX_DEPTH`, `GENEALOGY_API_URL`,
    /// `GENEALOGY_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        let config = match Self::default_path() {
            Ok(path) => Self::load(&path)?,
            Err(_) => Self::default(),
        };
        config.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup
    pub fn with_env_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(depth) = var("GENEALOGY_MAX_DEPTH") {
            self.max_depth = depth
                .parse()
                .map_err(|_| Error::Config(format!("Invalid GENEALOGY_MAX_DEPTH: {}", depth)))?;
        }
        if let Some(url) = var("GENEALOGY_API_URL") {
            self.api_url = url;
        }
        if let Some(secs) = var("GENEALOGY_TIMEOUT_SECS") {
            self.timeout_secs = secs.parse().map_err(|_| {
                Error::Config(format!("Invalid GENEALOGY_TIMEOUT_SECS: {}", secs))
            })?;
        }
        Ok(self)
    }

    /// Save to a file, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
