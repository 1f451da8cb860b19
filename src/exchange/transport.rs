//! Transport seam between the worker and the exchange service.

use crate::error::TransportError;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

/// HTTP verbs used by the exchange API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
        }
    }
}

/// Sends one authenticated JSON request to the exchange.
///
/// `path` is relative to the API root (`exchange/requests`, not
/// `/v1/exchange/requests`). A successful call yields the decoded body, or
/// `Value::Null` when the service sent none. Every failure, including non-2xx
/// responses, is a [`TransportError`].
#[async_trait]
pub trait ExchangeTransport: Send + Sync {
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<Value, TransportError>;
}

/// Percent-encode a single path segment. Only RFC 3986 unreserved
/// characters pass through.
pub fn encode_path_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}
