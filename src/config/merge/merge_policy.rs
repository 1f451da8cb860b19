//! Built-in defaults, the lowest-precedence layer.

use crate::config::AgentConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat};

/// Builder seeded with the serialized defaults of [`AgentConfig`].
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = toml::to_string(&AgentConfig::default())
        .map_err(|e| ConfigError::Message(format!("Failed to serialize defaults: {}", e)))?;
    Ok(Config::builder().add_source(File::from_str(&defaults, FileFormat::Toml)))
}
