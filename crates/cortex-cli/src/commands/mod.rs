//! Subcommand implementations and the wiring they share.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use cortex_core::config::{load_config_from, CortexConfig};
use cortex_core::content::ContentStore;
use cortex_core::persistence::{FileStore, KeyValueStore};

pub mod counts;
pub mod dashboard;
pub mod quiz;
pub mod search;
pub mod show;

/// Command-line values that take precedence over the config file.
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub content: Option<PathBuf>,
    pub storage_dir: Option<PathBuf>,
}

pub fn resolve_config(overrides: &Overrides) -> Result<CortexConfig> {
    let mut config = load_config_from(overrides.config.as_deref())?;
    if let Some(content) = &overrides.content {
        config.content_path = content.clone();
    }
    if let Some(dir) = &overrides.storage_dir {
        config.storage_dir = dir.clone();
    }
    Ok(config)
}

pub fn load_content(config: &CortexConfig) -> Result<Arc<ContentStore>> {
    let store = ContentStore::from_path(&config.content_path).with_context(|| {
        format!(
            "could not load content (set --content or CORTEX_CONTENT): {}",
            config.content_path.display()
        )
    })?;
    if store.is_empty() {
        tracing::warn!(path = %config.content_path.display(), "content file has no usable entries");
    }
    Ok(Arc::new(store))
}

pub fn open_storage(config: &CortexConfig) -> Arc<dyn KeyValueStore> {
    Arc::new(FileStore::new(&config.storage_dir))
}
