//! MergeService: orchestrates sources, applies merge policy, deserializes to AgentConfig.

use crate::config::sources::{environment, file};
use crate::config::AgentConfig;
use config::ConfigError;
use std::path::Path;

use super::merge_policy;

/// Merge service for config composition.
pub struct MergeService;

impl MergeService {
    /// Precedence: defaults (lowest) -> explicit file, else user file -> environment (highest).
    /// `CLAWPRINT_API_KEY` fills the API key only when no layer set one.
    pub fn load(explicit: Option<&Path>) -> Result<AgentConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = match explicit {
            Some(path) => file::add_explicit(builder, path)?,
            None => file::add_user_file(builder)?,
        };
        let builder = environment::add_to_builder(builder)?;

        let mut config: AgentConfig = builder.build()?.try_deserialize()?;
        if config.exchange.api_key.as_deref().map_or(true, str::is_empty) {
            config.exchange.api_key = environment::api_key_fallback();
        }
        Ok(config)
    }
}
