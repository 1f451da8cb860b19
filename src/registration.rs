//! Agent registration
//!
//! Publishes the agent card to the registry (`POST agents`) and patches an
//! existing listing (`PATCH agents/:handle`).

use crate::card::AgentProfile;
use crate::error::ApiError;
use crate::registry::RegistryClient;
use serde_json::{Map, Value};
use tracing::info;

/// Fields the registry refuses to register without.
pub const REQUIRED_FIELDS: [&str; 3] = ["name", "handle", "description"];

/// Check the card carries every required field as a non-empty value.
pub fn validate_for_registration(profile: &AgentProfile) -> Result<(), ApiError> {
    let card = profile.card_json();
    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| match card.get(*field) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(_) => false,
        })
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(format!(
            "Agent card is missing required fields: {}",
            missing.join(", ")
        )))
    }
}

/// Publishes and maintains one agent's registry listing.
pub struct Registrar {
    registry: RegistryClient,
    handle: String,
}

impl Registrar {
    pub fn new(registry: RegistryClient, handle: impl Into<String>) -> Self {
        Self {
            registry,
            handle: handle.into(),
        }
    }

    /// Register the agent described by `profile`. Needs no API key; the
    /// registry's response carries the new one.
    pub async fn register(&self, profile: &AgentProfile) -> Result<Value, ApiError> {
        validate_for_registration(profile)?;
        info!(handle = %profile.handle, "Registering agent");
        self.registry.register(profile.card_json()).await
    }

    /// Patch fields of the agent's listing. Needs an API key and at least
    /// one field.
    pub async fn update(&self, fields: Map<String, Value>) -> Result<Value, ApiError> {
        info!(handle = %self.handle, fields = ?fields.keys().collect::<Vec<_>>(), "Updating agent");
        self.registry.update(&self.handle, fields).await
    }
}
