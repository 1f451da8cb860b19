//! Named handler lookup.

use super::contract::{Handler, HandlerContext};
use crate::error::ApiError;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Returns `{"echo": payload}`. Useful for smoke-testing a deployment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoHandler;

#[async_trait]
impl Handler for EchoHandler {
    async fn execute(&self, payload: Value, _ctx: &HandlerContext) -> anyhow::Result<Value> {
        Ok(json!({ "echo": payload }))
    }
}

/// Handlers selectable by name from configuration.
///
/// Embedders register their own handlers before the worker is built.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<String, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in handlers.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("echo", Arc::new(EchoHandler));
        registry
    }

    /// Register a handler, replacing any previous one with the same name.
    pub fn register(&mut self, name: impl Into<String>, handler: Arc<dyn Handler>) {
        self.handlers.insert(name.into(), handler);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.get(name).cloned()
    }

    pub fn get_or_error(&self, name: &str) -> Result<Arc<dyn Handler>, ApiError> {
        self.get(name).ok_or_else(|| {
            ApiError::ConfigError(format!(
                "Unknown handler '{}'. Available: {}",
                name,
                self.names().join(", ")
            ))
        })
    }

    pub fn names(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }
}
