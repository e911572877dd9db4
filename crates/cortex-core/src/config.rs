//! Runtime configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level cortex configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CortexConfig {
    /// Content file with `atlas`, `why` and `quiz` sections.
    pub content_path: PathBuf,
    /// Directory holding the progress and history files.
    pub storage_dir: PathBuf,
    pub autosave_interval_secs: u64,
    pub tick_interval_secs: u64,
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for CortexConfig {
    fn default() -> Self {
        Self {
            content_path: PathBuf::from("content.json"),
            storage_dir: default_storage_dir(),
            autosave_interval_secs: 30,
            tick_interval_secs: 1,
            log_filter: "cortex=info".to_string(),
        }
    }
}

impl CortexConfig {
    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs.max(1))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs.max(1))
    }

    /// Apply `CORTEX_CONTENT` / `CORTEX_STORAGE_DIR` from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("CORTEX_CONTENT").filter(|v| !v.is_empty()) {
            self.content_path = PathBuf::from(path);
        }
        if let Some(dir) = lookup("CORTEX_STORAGE_DIR").filter(|v| !v.is_empty()) {
            self.storage_dir = PathBuf::from(dir);
        }
    }
}

/// Load config from an explicit path, or search the well-known paths:
///
/// 1. `cortex.toml` in the current directory
/// 2. `~/.config/cortex/config.toml`
///
/// Environment variable overrides: `CORTEX_CONTENT`, `CORTEX_STORAGE_DIR`.
pub fn load_config_from(path: Option<&Path>) -> Result<CortexConfig, ConfigError> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => return Err(ConfigError::NotFound(p.to_path_buf())),
        None => {
            let local = PathBuf::from("cortex.toml");
            if local.exists() {
                Some(local)
            } else {
                config_dir()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            parse_config_file(&path)?
        }
        None => CortexConfig::default(),
    };
    config.apply_overrides(|key| std::env::var(key).ok());
    Ok(config)
}

fn parse_config_file(path: &Path) -> Result<CortexConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn home() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}

fn config_dir() -> Option<PathBuf> {
    home().map(|h| h.join(".config").join("cortex"))
}

fn default_storage_dir() -> PathBuf {
    home()
        .map(|h| h.join(".local").join("share").join("cortex"))
        .unwrap_or_else(|| PathBuf::from(".cortex"))
}
