//! Tooling & Integration Layer
//!
//! Command-line interface over the worker, the agent card, the memory store
//! and registration.

pub mod cli;
pub mod format;

pub use cli::{Cli, CliContext, Commands};
