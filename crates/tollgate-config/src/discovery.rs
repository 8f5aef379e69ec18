//! Config file discovery.
//!
//! The first file found wins:
//! 1. an explicit path (must exist)
//! 2. `~/.config/tollgate/tollgate.toml` (XDG user config)
//! 3. `./tollgate.toml` (working directory)
//!
//! Environment overrides are applied on top of whichever file was loaded.

use std::path::{Path, PathBuf};

use crate::env::apply_process_env;
use crate::{ConfigError, Result, TollgateConfig};

/// Config filename, both in the XDG directory and the working directory.
const CONFIG_FILE: &str = "tollgate.toml";

/// Application name for XDG directory resolution.
const APP_NAME: &str = "tollgate";

/// Environment variable to override the config directory.
const CONFIG_DIR_ENV: &str = "TOLLGATE_CONFIG_DIR";

/// Result of config discovery and loading.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Configuration after file and environment layers.
    pub config: TollgateConfig,
    /// The file that was loaded, if any.
    pub source: Option<PathBuf>,
}

/// Discover, load and apply environment overrides.
///
/// An explicit `path` that cannot be read is an error; missing discovered
/// files are not.
pub fn load_config(path: Option<&Path>) -> Result<LoadedConfig> {
    let (mut config, source) = match path {
        Some(path) => (load_config_file(path)?, Some(path.to_path_buf())),
        None => match discover() {
            Some(found) => (load_config_file(&found)?, Some(found)),
            None => (TollgateConfig::default(), None),
        },
    };

    apply_process_env(&mut config)?;

    Ok(LoadedConfig { config, source })
}

/// Load config from a specific file path (no discovery, no env overrides).
pub fn load_config_file(path: &Path) -> Result<TollgateConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    TollgateConfig::from_toml(&contents)
}

/// Get the XDG config file path for tollgate.
pub fn xdg_config_path() -> Option<PathBuf> {
    xdg_config_dir().map(|d| d.join(CONFIG_FILE))
}

/// Get the XDG config directory for tollgate.
///
/// Checks `TOLLGATE_CONFIG_DIR` first, then falls back to the platform default.
pub fn xdg_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

fn discover() -> Option<PathBuf> {
    xdg_config_path()
        .into_iter()
        .chain(std::iter::once(PathBuf::from(CONFIG_FILE)))
        .find(|p| p.is_file())
}
