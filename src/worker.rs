//! Exchange Worker
//!
//! Polls the exchange for requests in the agent's domains, bids on each,
//! waits a bounded time for acceptance, runs the handler, delivers the result
//! and reports the outcome.

pub mod outcome;
pub mod policy;
pub mod runner;

pub use outcome::RequestOutcome;
pub use policy::{AcceptancePolicy, WorkerSettings, MIN_ERROR_BACKOFF};
pub use runner::ExchangeWorker;
