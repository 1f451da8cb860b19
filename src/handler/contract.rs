//! Handler contract.

use crate::exchange::ExchangeRequest;
use crate::memory::MemoryStore;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;

/// Explicit environment handed to handlers, taken from `[worker.env]`.
///
/// Handlers read configuration from here rather than from process state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandlerEnv {
    vars: BTreeMap<String, String>,
}

impl HandlerEnv {
    pub fn new(vars: BTreeMap<String, String>) -> Self {
        Self { vars }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.vars.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Everything a handler may see about the task it is executing.
#[derive(Debug, Clone)]
pub struct HandlerContext {
    /// The request as discovered, raw body included
    pub request: ExchangeRequest,
    /// Transaction created when the offer was accepted
    pub tx_id: String,
    pub memory: MemoryStore,
    pub env: HandlerEnv,
}

/// User-supplied work function run once per accepted request.
///
/// The returned value is delivered verbatim as the result. Any error is
/// reported to the exchange as a failure and nothing is delivered.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn execute(&self, payload: Value, ctx: &HandlerContext) -> anyhow::Result<Value>;
}
