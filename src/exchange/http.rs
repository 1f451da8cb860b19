//! reqwest-backed exchange transport.

use super::transport::{ExchangeTransport, Method};
use crate::config::ExchangeConfig;
use crate::error::TransportError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Versioned API prefix appended to the base URL.
pub const API_PREFIX: &str = "v1";

pub const USER_AGENT: &str = concat!("clawprint-agent/", env!("CARGO_PKG_VERSION"));

/// Exchange transport over HTTPS.
///
/// The client is built once; its timeout applies to every call.
pub struct HttpExchangeTransport {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpExchangeTransport {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| {
                TransportError::with_code(format!("Failed to create HTTP client: {}", e), "client")
            })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            timeout,
        })
    }

    pub fn from_config(config: &ExchangeConfig) -> Result<Self, TransportError> {
        Self::new(
            &config.base_url,
            config.api_key.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            API_PREFIX,
            path.trim_start_matches('/')
        )
    }

    fn map_send_error(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::with_code(
                format!("Request timed out after {}s", self.timeout.as_secs()),
                "timeout",
            )
        } else if err.is_connect() {
            TransportError::with_code(format!("Connection failed: {}", err), "connection_error")
        } else {
            TransportError::with_code(format!("Request failed: {}", err), "request_error")
        }
    }
}

#[async_trait]
impl ExchangeTransport for HttpExchangeTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<Value, TransportError> {
        let url = self.url(path);
        debug!(%method, %url, "Exchange request");

        let mut builder = self.http.request(method.into(), &url);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let response = builder.send().await.map_err(|e| self.map_send_error(e))?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| self.map_send_error(e))?;

        let decoded: Option<Value> = if bytes.is_empty() {
            None
        } else {
            serde_json::from_slice(&bytes).ok()
        };

        debug!(%method, %url, status = status.as_u16(), "Exchange response");
        if status.is_success() {
            Ok(decoded.unwrap_or(Value::Null))
        } else {
            Err(TransportError::from_response(status.as_u16(), decoded))
        }
    }
}
