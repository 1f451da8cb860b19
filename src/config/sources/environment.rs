//! Environment variable source: CLAWPRINT_* prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

pub const ENV_PREFIX: &str = "CLAWPRINT";

/// Add environment variable overlay to builder.
///
/// `CLAWPRINT_WORKER__POLL_INTERVAL_SECS=10` sets `worker.poll_interval_secs`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );
    Ok(builder)
}

/// Value of the bare `CLAWPRINT_API_KEY` variable, if set and non-empty.
pub fn api_key_fallback() -> Option<String> {
    std::env::var(crate::config::API_KEY_ENV)
        .ok()
        .filter(|key| !key.trim().is_empty())
}
