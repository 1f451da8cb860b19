//! Exchange protocol entities as seen by the agent.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// An open task published by the exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRequest {
    pub id: String,
    pub domains: Vec<String>,
    /// The request exactly as the service returned it
    pub raw: Value,
}

/// Lifecycle state of a submitted offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OfferState {
    Pending,
    Accepted,
    Rejected,
    Expired,
    /// Any state this client does not know about
    Other(String),
}

impl OfferState {
    pub fn parse(text: &str) -> Self {
        match text.trim().to_ascii_lowercase().as_str() {
            "pending" => OfferState::Pending,
            "accepted" => OfferState::Accepted,
            "rejected" => OfferState::Rejected,
            "expired" => OfferState::Expired,
            other => OfferState::Other(other.to_string()),
        }
    }

    /// Whether the acceptance wait should stop on this state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OfferState::Accepted | OfferState::Rejected | OfferState::Expired
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            OfferState::Pending => "pending",
            OfferState::Accepted => "accepted",
            OfferState::Rejected => "rejected",
            OfferState::Expired => "expired",
            OfferState::Other(s) => s,
        }
    }
}

impl fmt::Display for OfferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response to submitting an offer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OfferReceipt {
    pub offer_id: Option<String>,
    /// Present when the deployment accepts offers synchronously
    pub tx_id: Option<String>,
}

/// Response to polling an offer.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferStatus {
    pub state: OfferState,
    pub tx_id: Option<String>,
}

impl OfferStatus {
    pub fn pending() -> Self {
        Self {
            state: OfferState::Pending,
            tx_id: None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.state == OfferState::Accepted
    }
}

/// Bid attached to every offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferPricing {
    /// Pricing model, `free` by default
    #[serde(default = "default_pricing_model")]
    pub model: String,

    #[serde(default)]
    pub amount: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

fn default_pricing_model() -> String {
    "free".to_string()
}

impl Default for OfferPricing {
    fn default() -> Self {
        Self {
            model: default_pricing_model(),
            amount: 0.0,
            currency: None,
        }
    }
}

/// Reputation outcome sent to the report endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutcome {
    Success { rating: u8 },
    Failure { reason: String },
}

impl ReportOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportOutcome::Success { .. } => "success",
            ReportOutcome::Failure { .. } => "failure",
        }
    }
}
