//! Result of carrying one request through the exchange protocol.

use crate::exchange::OfferState;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    /// Delivered and reported as a success
    Completed { request_id: String, tx_id: String },
    /// Rejected, expired, or still pending when the wait ran out
    NotAccepted {
        request_id: String,
        state: OfferState,
    },
    /// The offer could not be submitted
    OfferFailed { request_id: String, error: String },
    HandlerFailed {
        request_id: String,
        tx_id: String,
        error: String,
    },
    DeliveryFailed {
        request_id: String,
        tx_id: String,
        error: String,
    },
    /// Accepted, but no transaction id was ever supplied
    MissingTransaction { request_id: String },
}

impl RequestOutcome {
    pub fn request_id(&self) -> &str {
        match self {
            RequestOutcome::Completed { request_id, .. }
            | RequestOutcome::NotAccepted { request_id, .. }
            | RequestOutcome::OfferFailed { request_id, .. }
            | RequestOutcome::HandlerFailed { request_id, .. }
            | RequestOutcome::DeliveryFailed { request_id, .. }
            | RequestOutcome::MissingTransaction { request_id } => request_id,
        }
    }

    pub fn tx_id(&self) -> Option<&str> {
        match self {
            RequestOutcome::Completed { tx_id, .. }
            | RequestOutcome::HandlerFailed { tx_id, .. }
            | RequestOutcome::DeliveryFailed { tx_id, .. } => Some(tx_id),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, RequestOutcome::Completed { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            RequestOutcome::Completed { .. } => "completed",
            RequestOutcome::NotAccepted { .. } => "not_accepted",
            RequestOutcome::OfferFailed { .. } => "offer_failed",
            RequestOutcome::HandlerFailed { .. } => "handler_failed",
            RequestOutcome::DeliveryFailed { .. } => "delivery_failed",
            RequestOutcome::MissingTransaction { .. } => "missing_transaction",
        }
    }
}

impl fmt::Display for RequestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestOutcome::Completed { request_id, tx_id } => {
                write!(f, "request {} completed (tx {})", request_id, tx_id)
            }
            RequestOutcome::NotAccepted { request_id, state } => {
                write!(f, "request {} not accepted ({})", request_id, state)
            }
            RequestOutcome::OfferFailed { request_id, error } => {
                write!(f, "request {}: offer failed: {}", request_id, error)
            }
            RequestOutcome::HandlerFailed {
                request_id, error, ..
            } => write!(f, "request {}: handler failed: {}", request_id, error),
            RequestOutcome::DeliveryFailed {
                request_id, error, ..
            } => write!(f, "request {}: delivery failed: {}", request_id, error),
            RequestOutcome::MissingTransaction { request_id } => {
                write!(f, "request {} accepted without a transaction id", request_id)
            }
        }
    }
}
