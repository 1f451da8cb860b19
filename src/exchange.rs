//! Exchange
//!
//! Client side of the brokered task exchange. The [`ExchangeTransport`] trait
//! is the seam the worker talks through; [`HttpExchangeTransport`] is the
//! production implementation and tests substitute scripted stubs.

pub mod client;
pub mod envelope;
pub mod http;
pub mod transport;
pub mod types;

pub use client::ExchangeClient;
pub use envelope::{extract_payload, RequestsEnvelope};
pub use http::HttpExchangeTransport;
pub use transport::{encode_path_segment, ExchangeTransport, Method};
pub use types::{
    ExchangeRequest, OfferPricing, OfferReceipt, OfferState, OfferStatus, ReportOutcome,
};
