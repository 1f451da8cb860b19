//! XDG Base Directory lookup for the agent's config file.

use crate::error::ApiError;
use std::path::PathBuf;

/// Directory name under the XDG config home.
pub const APP_DIR: &str = "clawprint";

/// File name of the user-level config.
pub const CONFIG_FILE: &str = "agent.toml";

/// Get XDG config home directory
///
/// Returns `$XDG_CONFIG_HOME` if set, otherwise defaults to `$HOME/.config`
pub fn config_home() -> Result<PathBuf, ApiError> {
    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg_config_home.is_empty() {
            return Ok(PathBuf::from(xdg_config_home));
        }
    }

    let home = std::env::var("HOME").map_err(|_| {
        ApiError::ConfigError(
            "Could not determine XDG config home directory (HOME not set)".to_string(),
        )
    })?;

    Ok(PathBuf::from(home).join(".config"))
}

/// `$XDG_CONFIG_HOME/clawprint/agent.toml`, whether or not it exists.
pub fn user_config_path() -> Result<PathBuf, ApiError> {
    Ok(config_home()?.join(APP_DIR).join(CONFIG_FILE))
}
