//! Scripted exchange transport and handlers shared by the worker tests.

use async_trait::async_trait;
use clawprint_agent::card::AgentProfile;
use clawprint_agent::error::TransportError;
use clawprint_agent::exchange::{ExchangeTransport, Method};
use clawprint_agent::handler::{Handler, HandlerContext, HandlerEnv};
use clawprint_agent::memory::MemoryStore;
use clawprint_agent::worker::{AcceptancePolicy, ExchangeWorker, WorkerSettings};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub const CARD: &str = "\
name: Demo Agent
handle: demo-agent
description: Answers research questions
services:
  - id: research
    domains: [research, summaries]
";

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RecordedCall {
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Responds from per-route queues. The last queued response of a route is
/// repeated once the others are used up. Unscripted routes answer 404.
#[derive(Default)]
pub struct StubTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Result<Value, TransportError>>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl StubTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, method: Method, path: &str, responses: Vec<Result<Value, TransportError>>) {
        self.routes
            .lock()
            .insert((method, path.to_string()), responses.into());
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn calls_to(&self, method: Method, path: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method && c.path == path)
            .collect()
    }

    /// `"METHOD path"` for every call, in order.
    pub fn sequence(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|c| format!("{} {}", c.method, c.path))
            .collect()
    }
}

#[async_trait]
impl ExchangeTransport for StubTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<Value, TransportError> {
        self.calls.lock().push(RecordedCall {
            method,
            path: path.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            body,
        });

        let mut routes = self.routes.lock();
        match routes.get_mut(&(method, path.to_string())) {
            Some(queue) if queue.len() > 1 => queue
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::new("empty script"))),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| Err(TransportError::new("empty script"))),
            None => Err(TransportError::from_response(404, None)),
        }
    }
}

/// Returns `{"ok": true}` and counts invocations.
#[derive(Default)]
pub struct OkHandler {
    pub payloads: Mutex<Vec<Value>>,
}

#[async_trait]
impl Handler for OkHandler {
    async fn execute(&self, payload: Value, _ctx: &HandlerContext) -> anyhow::Result<Value> {
        self.payloads.lock().push(payload);
        Ok(serde_json::json!({"ok": true}))
    }
}

/// Fails on the payload `"fail"`, otherwise returns `{"ok": true}`.
pub struct SelectiveHandler;

#[async_trait]
impl Handler for SelectiveHandler {
    async fn execute(&self, payload: Value, _ctx: &HandlerContext) -> anyhow::Result<Value> {
        if payload == Value::from("fail") {
            anyhow::bail!("boom");
        }
        Ok(serde_json::json!({"ok": true}))
    }
}

pub fn test_settings() -> WorkerSettings {
    WorkerSettings {
        poll_interval: Duration::from_secs(2),
        run_once: true,
        rating: 5,
        pricing: Default::default(),
        acceptance: AcceptancePolicy::default(),
    }
}

pub fn build_worker(
    transport: Arc<StubTransport>,
    handler: Arc<dyn Handler>,
    dir: &Path,
    settings: WorkerSettings,
) -> ExchangeWorker {
    ExchangeWorker::new(
        transport,
        AgentProfile::parse(CARD).unwrap(),
        handler,
        MemoryStore::open(dir.join("memory.json")).unwrap(),
        HandlerEnv::default(),
        settings,
    )
}

static ENV_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// Run `f` with environment variables set, restoring them afterwards.
/// Tests that touch the process environment serialize on one lock.
pub fn with_env<R>(vars: &[(&str, &str)], f: impl FnOnce() -> R) -> R {
    let _guard = ENV_LOCK.lock();
    let previous: Vec<(String, Option<String>)> = vars
        .iter()
        .map(|(k, _)| (k.to_string(), std::env::var(k).ok()))
        .collect();
    for (key, value) in vars {
        std::env::set_var(key, value);
    }
    let result = f();
    for (key, value) in previous {
        match value {
            Some(v) => std::env::set_var(&key, v),
            None => std::env::remove_var(&key),
        }
    }
    result
}
