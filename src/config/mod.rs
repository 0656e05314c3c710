pub mod types;

use crate::error::{ConfigError, Result};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = ".sse-stream.toml";

/// Get the global config file path (~/.sse-stream.toml)
pub fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(CONFIG_FILE_NAME))
}

/// Load configuration.
///
/// An explicitly given file must exist and parse. Without one, the global
/// config is used if present and valid, otherwise defaults.
pub fn load_config(path: Option<&Path>) -> Result<types::Config> {
    if let Some(path) = path {
        return Ok(read_config(path)?);
    }

    if let Some(global) = global_config_path() {
        if global.exists() {
            match read_config(&global) {
                Ok(config) => return Ok(config),
                Err(e) => log::warn!("Ignoring global config: {}", e),
            }
        }
    }

    Ok(types::Config::default())
}

fn read_config(path: &Path) -> std::result::Result<types::Config, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::ParsingFailed {
        path: path.to_path_buf(),
        source,
    })
}
