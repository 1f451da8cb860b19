//! ClawPrint Agent: Brokered Exchange Worker
//!
//! Agent-side worker for the ClawPrint exchange. It reads an agent card
//! written in a restricted YAML dialect, polls the exchange for requests in
//! the card's domains, bids on them, and for accepted offers runs a handler,
//! delivers its result and reports the outcome.

pub mod card;
pub mod config;
pub mod error;
pub mod exchange;
pub mod handler;
pub mod logging;
pub mod memory;
pub mod registration;
pub mod registry;
pub mod tooling;
pub mod worker;
