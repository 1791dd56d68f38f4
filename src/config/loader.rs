// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a recipe from `path` without validating it.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;
    debug!(path = %path.display(), tasks = config.task.len(), "parsed recipe");

    Ok(config)
}

/// Load a recipe from `path` and validate it.
///
/// This is the entry point the rest of the application uses: it rejects
/// empty recipes, self-dependencies and cycles.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Recipe path used when none is given: `Taskdag.toml` in the current
/// directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Taskdag.toml")
}
