// src/config.rs

//! Configuration loading utilities.
//!
//! Convenience functions that load the TOML config and the seed list together
//! and validate both before any network work starts.

use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::models::{Config, SeedList};

/// Load configuration from a TOML file.
///
/// A missing file falls back to defaults; a malformed one is an error.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        log::warn!(
            "Config file {} not found, using default configuration",
            path.display()
        );
        return Ok(Config::default());
    }
    Config::load(path).map_err(|e| AppError::config(format!("{}: {e}", path.display())))
}

/// Resolve the seed list path. `override_path` wins over the config entry.
pub fn seeds_path(config: &Config, override_path: Option<&Path>) -> PathBuf {
    override_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.paths.seeds_file.clone())
}

/// Load and validate both config and seed list.
pub fn load_all(config_path: &Path, seeds_override: Option<&Path>) -> Result<(Config, SeedList)> {
    let config = load_config(config_path)?;
    config.validate()?;

    let seeds_path = seeds_path(&config, seeds_override);
    let seeds = SeedList::load(&seeds_path)
        .map_err(|e| AppError::config(format!("Invalid seed list {}: {e}", seeds_path.display())))?;
    seeds.validate()?;

    Ok((config, seeds))
}
