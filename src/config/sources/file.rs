//! TOML file source: an explicit path, or the user config file when present.

use crate::config::paths::xdg_root;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File, FileFormat};
use std::path::Path;
use tracing::debug;

/// Add an explicit config file. A missing file is an error.
pub fn add_explicit(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::Message(format!(
            "Config file not found: {}",
            path.display()
        )));
    }
    debug!(path = %path.display(), "Loading config file");
    Ok(builder.add_source(File::from(path).format(FileFormat::Toml).required(true)))
}

/// Add `$XDG_CONFIG_HOME/clawprint/agent.toml` if it exists.
pub fn add_user_file(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    match xdg_root::user_config_path() {
        Ok(path) if path.is_file() => {
            debug!(path = %path.display(), "Loading user config file");
            Ok(builder.add_source(File::from(path).format(FileFormat::Toml).required(false)))
        }
        _ => Ok(builder),
    }
}
