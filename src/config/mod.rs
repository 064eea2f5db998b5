pub mod bandwidth;
pub mod paths;
pub mod types;

use std::path::Path;

use crate::error::TrickleError;

use self::types::ThrottleConfig;

/// Load a config file.
///
/// An explicit `path` must exist. Without one, the default location is tried
/// and a missing file yields an empty config.
pub fn load_config(path: Option<&Path>) -> Result<ThrottleConfig, TrickleError> {
    let path = match path {
        Some(path) => {
            if !path.exists() {
                return Err(TrickleError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match paths::default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(ThrottleConfig::default()),
        },
    };

    tracing::debug!(path = %path.display(), "Loading config file");
    let contents = std::fs::read_to_string(&path)?;
    Ok(toml::from_str(&contents)?)
}
