//! Platform-specific config file location.
//!
//! Uses the `dirs` crate to resolve the platform config directory:
//! - Linux:   `~/.config/trickle/config.toml`
//! - Windows: `%APPDATA%\trickle\config.toml`
//! - macOS:   `~/Library/Application Support/trickle/config.toml`

use std::path::PathBuf;

const APP_DIR: &str = "trickle";
const CONFIG_FILE: &str = "config.toml";

/// Get the trickle config directory. Does not create it.
pub fn trickle_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join(APP_DIR))
}

/// Path of the default config file, whether or not it exists.
pub fn default_config_path() -> Option<PathBuf> {
    trickle_config_dir().map(|dir| dir.join(CONFIG_FILE))
}
