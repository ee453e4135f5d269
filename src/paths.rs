//! Centralized path resolution for itemctl
//!
//! # Environment Variables
//!
//! - `ITEMCTL_CONFIG_DIR` - Override config directory
//! - `ITEMCTL_STATE_DIR` - Override state directory
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `ITEMCTL_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/itemctl` (if set)
//! 3. Platform default:
//!    - Windows: `%APPDATA%\itemctl`
//!    - macOS/Linux: `~/.config/itemctl`
//!
//! For state_dir():
//! 1. `ITEMCTL_STATE_DIR` environment variable
//! 2. `XDG_STATE_HOME/itemctl` (if set)
//! 3. Platform default:
//!    - Windows: `%LOCALAPPDATA%\itemctl`
//!    - macOS/Linux: `~/.local/state/itemctl`

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "ITEMCTL_CONFIG_DIR";

/// Environment variable for state directory override
pub const ENV_STATE_DIR: &str = "ITEMCTL_STATE_DIR";

const APP_NAME: &str = "itemctl";

/// Get the itemctl config directory path
pub fn config_dir() -> Result<PathBuf> {
    config_dir_with(|key| std::env::var(key).ok())
}

/// Get the itemctl state directory path
pub fn state_dir() -> Result<PathBuf> {
    state_dir_with(|key| std::env::var(key).ok())
}

/// Default configuration file
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Default state file
pub fn state_file() -> Result<PathBuf> {
    Ok(state_dir()?.join("state.toml"))
}

fn config_dir_with(env: impl Fn(&str) -> Option<String>) -> Result<PathBuf> {
    if let Some(dir) = env(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!("Using config dir from {ENV_CONFIG_DIR}: {}", path.display());
        return Ok(path);
    }

    if let Some(xdg_config) = env("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join(APP_NAME);
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            return Ok(app_data.join(APP_NAME));
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join(APP_NAME);
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

fn state_dir_with(env: impl Fn(&str) -> Option<String>) -> Result<PathBuf> {
    if let Some(dir) = env(ENV_STATE_DIR) {
        let path = expand(&dir);
        log::debug!("Using state dir from {ENV_STATE_DIR}: {}", path.display());
        return Ok(path);
    }

    if let Some(xdg_state) = env("XDG_STATE_HOME") {
        let path = PathBuf::from(xdg_state).join(APP_NAME);
        log::debug!("Using XDG_STATE_HOME: {}", path.display());
        return Ok(path);
    }

    #[cfg(windows)]
    {
        if let Some(local_app_data) = dirs::data_local_dir() {
            return Ok(local_app_data.join(APP_NAME));
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".local").join("state").join(APP_NAME);
    log::debug!("Using default state dir: {}", path.display());
    Ok(path)
}

/// Expand ~ and environment variables in a path string.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}
