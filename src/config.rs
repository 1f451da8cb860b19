//! Agent configuration
//!
//! One explicit [`AgentConfig`] is built at process start and passed by
//! reference. Sources, lowest precedence first: built-in defaults, a TOML
//! file, then `CLAWPRINT_*` environment variables.

pub mod facade;
pub mod merge;
pub mod paths;
pub mod sources;

pub use facade::ConfigLoader;

use crate::error::ApiError;
use crate::exchange::OfferPricing;
use crate::logging::LoggingConfig;
use crate::worker::AcceptancePolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://clawprint.io";

/// Environment variable read when no API key is configured.
pub const API_KEY_ENV: &str = "CLAWPRINT_API_KEY";

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub exchange: ExchangeConfig,

    #[serde(default)]
    pub worker: WorkerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Exchange connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Per-request client timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ExchangeConfig {
    /// The configured key, or an error naming both ways to supply one.
    pub fn require_api_key(&self) -> Result<&str, ApiError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                ApiError::ConfigError(format!(
                    "API key required: set exchange.api_key or {}",
                    API_KEY_ENV
                ))
            })
    }
}

/// Acceptance wait, configured under `[worker.acceptance]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptanceConfig {
    #[serde(default = "default_acceptance_interval_ms")]
    pub interval_ms: u64,

    #[serde(default = "default_acceptance_attempts")]
    pub max_attempts: u32,
}

fn default_acceptance_interval_ms() -> u64 {
    1000
}

fn default_acceptance_attempts() -> u32 {
    60
}

impl Default for AcceptanceConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_acceptance_interval_ms(),
            max_attempts: default_acceptance_attempts(),
        }
    }
}

impl From<&AcceptanceConfig> for AcceptancePolicy {
    fn from(config: &AcceptanceConfig) -> Self {
        AcceptancePolicy {
            interval: Duration::from_millis(config.interval_ms),
            max_attempts: config.max_attempts,
        }
    }
}

/// Worker loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Agent card file
    #[serde(default = "default_card_path")]
    pub card_path: PathBuf,

    /// Memory store file handed to handlers
    #[serde(default = "default_memory_path")]
    pub memory_path: PathBuf,

    /// Handler name, resolved through the handler registry
    #[serde(default = "default_handler")]
    pub handler: String,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default)]
    pub run_once: bool,

    /// Rating sent with successful reports
    #[serde(default = "default_rating")]
    pub rating: u8,

    #[serde(default)]
    pub acceptance: AcceptanceConfig,

    #[serde(default)]
    pub pricing: OfferPricing,

    /// Variables passed to handlers as their environment
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

fn default_card_path() -> PathBuf {
    PathBuf::from("agent.yaml")
}

fn default_memory_path() -> PathBuf {
    PathBuf::from("memory.json")
}

fn default_handler() -> String {
    "echo".to_string()
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_rating() -> u8 {
    5
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            card_path: default_card_path(),
            memory_path: default_memory_path(),
            handler: default_handler(),
            poll_interval_secs: default_poll_interval_secs(),
            run_once: false,
            rating: default_rating(),
            acceptance: AcceptanceConfig::default(),
            pricing: OfferPricing::default(),
            env: BTreeMap::new(),
        }
    }
}

impl AgentConfig {
    /// Check values the type system cannot.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.exchange.base_url.trim().is_empty() {
            return Err(ApiError::Validation("exchange.base_url must not be empty".to_string()));
        }
        if !(1..=5).contains(&self.worker.rating) {
            return Err(ApiError::Validation(format!(
                "worker.rating must be between 1 and 5, got {}",
                self.worker.rating
            )));
        }
        if self.worker.acceptance.max_attempts == 0 {
            return Err(ApiError::Validation(
                "worker.acceptance.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.worker.handler.trim().is_empty() {
            return Err(ApiError::Validation("worker.handler must not be empty".to_string()));
        }
        Ok(())
    }

    /// Render as TOML with the API key masked.
    pub fn to_redacted_toml(&self) -> Result<String, ApiError> {
        let mut shown = self.clone();
        if let Some(key) = shown.exchange.api_key.as_mut() {
            *key = redact(key);
        }
        toml::to_string_pretty(&shown)
            .map_err(|e| ApiError::ConfigError(format!("Failed to render config: {}", e)))
    }
}

/// Keep the last four characters of a secret.
fn redact(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}
