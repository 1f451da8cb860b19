//! Typed exchange calls on top of an [`ExchangeTransport`].

use super::envelope::RequestsEnvelope;
use super::transport::{encode_path_segment, ExchangeTransport, Method};
use super::types::{ExchangeRequest, OfferPricing, OfferReceipt, OfferStatus, ReportOutcome};
use crate::error::TransportError;
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Exchange API bound to one agent handle.
#[derive(Clone)]
pub struct ExchangeClient {
    transport: Arc<dyn ExchangeTransport>,
    handle: String,
}

impl ExchangeClient {
    pub fn new(transport: Arc<dyn ExchangeTransport>, handle: impl Into<String>) -> Self {
        Self {
            transport,
            handle: handle.into(),
        }
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// Open requests matching any of `domains`. The filter is always sent,
    /// empty or not.
    pub async fn poll_requests(
        &self,
        domains: &[String],
    ) -> Result<Vec<ExchangeRequest>, TransportError> {
        let query = [
            ("domains", domains.join(",")),
            ("agent_handle", self.handle.clone()),
        ];
        let body = self
            .transport
            .request(Method::Get, "exchange/requests", &query, None)
            .await?;
        Ok(RequestsEnvelope::decode(body).into_requests())
    }

    pub async fn submit_offer(
        &self,
        request_id: &str,
        pricing: &OfferPricing,
    ) -> Result<OfferReceipt, TransportError> {
        let body = json!({
            "request_id": request_id,
            "agent_handle": self.handle,
            "pricing": pricing,
        });
        let response = self
            .transport
            .request(Method::Post, "exchange/offers", &[], Some(body))
            .await?;
        Ok(OfferReceipt::decode(&response))
    }

    pub async fn offer_status(&self, offer_id: &str) -> Result<OfferStatus, TransportError> {
        let path = format!("exchange/offers/{}", encode_path_segment(offer_id));
        let response = self.transport.request(Method::Get, &path, &[], None).await?;
        Ok(OfferStatus::decode(&response))
    }

    pub async fn deliver(&self, tx_id: &str, result: &Value) -> Result<(), TransportError> {
        let body = json!({
            "tx_id": tx_id,
            "agent_handle": self.handle,
            "result": result,
        });
        self.transport
            .request(Method::Post, "exchange/deliver", &[], Some(body))
            .await?;
        Ok(())
    }

    pub async fn report(
        &self,
        tx_id: &str,
        outcome: &ReportOutcome,
        meta: Value,
    ) -> Result<(), TransportError> {
        let mut body = Map::new();
        body.insert("agent_handle".to_string(), json!(self.handle));
        body.insert("tx_id".to_string(), json!(tx_id));
        body.insert("outcome".to_string(), json!(outcome.as_str()));
        match outcome {
            ReportOutcome::Success { rating } => {
                body.insert("rating".to_string(), json!(rating));
            }
            ReportOutcome::Failure { reason } => {
                body.insert("reason".to_string(), json!(reason));
            }
        }
        body.insert("meta".to_string(), meta);
        self.transport
            .request(Method::Post, "transactions/report", &[], Some(Value::Object(body)))
            .await?;
        Ok(())
    }
}
