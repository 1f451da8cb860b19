//! Response envelope decoding
//!
//! Deployments of the exchange wrap their responses differently. All of the
//! shape sniffing lives here so call sites only ever see typed values.

use super::types::{ExchangeRequest, OfferReceipt, OfferState, OfferStatus};
use serde_json::Value;
use tracing::warn;

/// The shapes a poll response has been observed in, in decoding precedence.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestsEnvelope {
    /// `{"requests": [...]}`
    Requests(Vec<Value>),
    /// `{"data": {"requests": [...]}}`
    DataRequests(Vec<Value>),
    /// `{"data": [...]}`
    Data(Vec<Value>),
    /// `[...]`
    Bare(Vec<Value>),
    /// Anything else, including `null`
    Unrecognized,
}

impl RequestsEnvelope {
    pub fn decode(body: Value) -> Self {
        let mut body = body;
        if let Value::Array(items) = body {
            return RequestsEnvelope::Bare(items);
        }
        if let Some(Value::Array(items)) = body.get_mut("requests").map(Value::take) {
            return RequestsEnvelope::Requests(items);
        }
        match body.get_mut("data").map(Value::take) {
            Some(Value::Array(items)) => RequestsEnvelope::Data(items),
            Some(mut data) => match data.get_mut("requests").map(Value::take) {
                Some(Value::Array(items)) => RequestsEnvelope::DataRequests(items),
                _ => RequestsEnvelope::Unrecognized,
            },
            None => RequestsEnvelope::Unrecognized,
        }
    }

    /// Typed requests; entries without an id are dropped with a warning.
    pub fn into_requests(self) -> Vec<ExchangeRequest> {
        let items = match self {
            RequestsEnvelope::Requests(items)
            | RequestsEnvelope::DataRequests(items)
            | RequestsEnvelope::Data(items)
            | RequestsEnvelope::Bare(items) => items,
            RequestsEnvelope::Unrecognized => return Vec::new(),
        };
        items
            .into_iter()
            .filter_map(|raw| {
                let request = decode_request(raw);
                if request.is_none() {
                    warn!("Skipping exchange request without an id");
                }
                request
            })
            .collect()
    }
}

/// Ids may arrive as strings or numbers. Strings are echoed back verbatim;
/// blank ones are rejected.
fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn decode_request(raw: Value) -> Option<ExchangeRequest> {
    let id = ["id", "request_id"]
        .iter()
        .find_map(|key| raw.get(*key).and_then(id_text))?;
    let domains = match raw.get("domains") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|d| d.as_str().map(str::to_string))
            .collect(),
        Some(Value::String(single)) => vec![single.clone()],
        _ => Vec::new(),
    };
    Some(ExchangeRequest { id, domains, raw })
}

/// Find `key` at the top level, then under `offer`, then under `data`.
fn lookup<'a>(body: &'a Value, key: &str) -> Option<&'a Value> {
    body.get(key)
        .or_else(|| body.get("offer").and_then(|o| o.get(key)))
        .or_else(|| body.get("data").and_then(|d| d.get(key)))
        .filter(|v| !v.is_null())
}

fn lookup_id(body: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| lookup(body, key).and_then(id_text))
}

fn decode_tx_id(body: &Value) -> Option<String> {
    lookup_id(body, &["tx_id", "transaction_id"])
        .or_else(|| body.get("transaction").and_then(|t| t.get("id")).and_then(id_text))
}

impl OfferReceipt {
    pub fn decode(body: &Value) -> Self {
        Self {
            offer_id: lookup_id(body, &["id", "offer_id"]),
            tx_id: decode_tx_id(body),
        }
    }
}

impl OfferStatus {
    /// A body without a recognisable state reads as pending.
    pub fn decode(body: &Value) -> Self {
        let state = ["state", "status"]
            .iter()
            .find_map(|key| lookup(body, key).and_then(Value::as_str))
            .map(OfferState::parse)
            .unwrap_or(OfferState::Pending);
        Self {
            state,
            tx_id: decode_tx_id(body),
        }
    }
}

/// The handler's input, by precedence: a string request as-is, then the
/// request's `payload`, `input` or `task` field, then the whole request.
pub fn extract_payload(raw: &Value) -> Value {
    if raw.is_string() {
        return raw.clone();
    }
    ["payload", "input", "task"]
        .iter()
        .find_map(|key| raw.get(*key).filter(|v| !v.is_null()))
        .unwrap_or(raw)
        .clone()
}
