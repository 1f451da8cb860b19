//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::AgentConfig;
use crate::error::ApiError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the user config file and environment.
    pub fn load() -> Result<AgentConfig, ApiError> {
        Self::load_with(None)
    }

    /// Load configuration from a specific file with environment overlay.
    pub fn load_from_file(path: &Path) -> Result<AgentConfig, ApiError> {
        Self::load_with(Some(path))
    }

    /// Load and validate, using `explicit` instead of the user file when given.
    pub fn load_with(explicit: Option<&Path>) -> Result<AgentConfig, ApiError> {
        let config = MergeService::load(explicit)?;
        config.validate()?;
        Ok(config)
    }

    /// Create default configuration.
    pub fn default() -> AgentConfig {
        AgentConfig::default()
    }
}
