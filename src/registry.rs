//! Registry client
//!
//! Read-side registry calls (search, agent cards, trust, domains, discovery),
//! security scanning, listing management and requester-side exchange
//! requests. Calls that need an API key are refused locally when none is
//! configured, before anything is sent.

use crate::config::{ExchangeConfig, API_KEY_ENV};
use crate::error::ApiError;
use crate::exchange::{encode_path_segment, ExchangeTransport, HttpExchangeTransport, Method};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Filters for `GET agents/search`. Unset fields are left out of the query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub domain: Option<String>,
    pub protocol: Option<String>,
    pub max_cost: Option<f64>,
    pub min_verification: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl SearchQuery {
    /// Query pairs for the set filters, in a fixed order.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let text = [
            ("q", &self.q),
            ("domain", &self.domain),
            ("protocol", &self.protocol),
        ];
        let mut query: Vec<(&'static str, String)> = text
            .into_iter()
            .filter_map(|(key, value)| value.clone().map(|v| (key, v)))
            .collect();
        if let Some(max_cost) = self.max_cost {
            query.push(("max_cost", max_cost.to_string()));
        }
        if let Some(level) = &self.min_verification {
            query.push(("min_verification", level.clone()));
        }
        if let Some(sort) = &self.sort {
            query.push(("sort", sort.clone()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            query.push(("offset", offset.to_string()));
        }
        query
    }
}

/// Registry API over an [`ExchangeTransport`].
#[derive(Clone)]
pub struct RegistryClient {
    transport: Arc<dyn ExchangeTransport>,
    authenticated: bool,
}

fn require_text(name: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!(
            "'{}' is required and cannot be empty",
            name
        )));
    }
    Ok(())
}

impl RegistryClient {
    /// `authenticated` says whether the transport carries an API key.
    pub fn new(transport: Arc<dyn ExchangeTransport>, authenticated: bool) -> Self {
        Self {
            transport,
            authenticated,
        }
    }

    pub fn from_config(config: &ExchangeConfig) -> Result<Self, ApiError> {
        let transport = HttpExchangeTransport::from_config(config)?;
        Ok(Self::new(
            Arc::new(transport),
            config.require_api_key().is_ok(),
        ))
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn require_auth(&self, operation: &str) -> Result<(), ApiError> {
        if self.authenticated {
            Ok(())
        } else {
            Err(ApiError::Unauthorized(format!(
                "{} requires an API key: set exchange.api_key or {}",
                operation, API_KEY_ENV
            )))
        }
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ApiError> {
        Ok(self.transport.request(Method::Get, path, query, None).await?)
    }

    async fn send(&self, method: Method, path: &str, body: Value) -> Result<Value, ApiError> {
        Ok(self.transport.request(method, path, &[], Some(body)).await?)
    }

    /// Search registered agents. With no filters the service returns its
    /// default page.
    pub async fn search(&self, query: &SearchQuery) -> Result<Value, ApiError> {
        let pairs = query.to_query();
        debug!(filters = pairs.len(), "Searching registry");
        self.get("agents/search", &pairs).await
    }

    /// Full agent card for `handle`.
    pub async fn get_agent(&self, handle: &str) -> Result<Value, ApiError> {
        require_text("handle", handle)?;
        self.get(&format!("agents/{}", encode_path_segment(handle)), &[])
            .await
    }

    /// Trust evaluation for `handle`.
    pub async fn trust(&self, handle: &str) -> Result<Value, ApiError> {
        require_text("handle", handle)?;
        self.get(&format!("trust/{}", encode_path_segment(handle)), &[])
            .await
    }

    pub async fn domains(&self) -> Result<Value, ApiError> {
        self.get("domains", &[]).await
    }

    /// API discovery document.
    pub async fn discover(&self) -> Result<Value, ApiError> {
        self.get("discover", &[]).await
    }

    /// Scan text for security threats. Needs an API key.
    pub async fn scan(&self, content: &str) -> Result<Value, ApiError> {
        self.require_auth("scan")?;
        require_text("content", content)?;
        self.send(Method::Post, "security/scan", json!({ "content": content }))
            .await
    }

    /// Register a new agent. No key is needed; the response carries the
    /// new agent's key.
    pub async fn register(&self, card: Value) -> Result<Value, ApiError> {
        self.send(Method::Post, "agents", card).await
    }

    /// Patch fields of an existing listing. Needs an API key and at least one
    /// field.
    pub async fn update(
        &self,
        handle: &str,
        fields: Map<String, Value>,
    ) -> Result<Value, ApiError> {
        self.require_auth("update")?;
        require_text("handle", handle)?;
        if fields.is_empty() {
            return Err(ApiError::Validation(
                "Update requires at least one field".to_string(),
            ));
        }
        let path = format!("agents/{}", encode_path_segment(handle));
        self.send(Method::Patch, &path, Value::Object(fields)).await
    }

    /// Post a new exchange request as a requester. Needs an API key.
    pub async fn create_exchange_request(
        &self,
        domains: &[String],
        task: &str,
        requirements: Option<Value>,
    ) -> Result<Value, ApiError> {
        self.require_auth("create_exchange_request")?;
        require_text("task", task)?;
        let mut body = Map::new();
        body.insert("domains".to_string(), json!(domains));
        body.insert("task".to_string(), json!(task));
        if let Some(requirements) = requirements.filter(|r| !r.is_null()) {
            body.insert("requirements".to_string(), requirements);
        }
        self.send(Method::Post, "exchange/requests", Value::Object(body))
            .await
    }

    /// Status of an exchange request this requester created. Needs an API key.
    pub async fn get_exchange_request(&self, request_id: &str) -> Result<Value, ApiError> {
        self.require_auth("get_exchange_request")?;
        require_text("request_id", request_id)?;
        let path = format!("exchange/requests/{}", encode_path_segment(request_id));
        self.get(&path, &[]).await
    }
}
