//! Task handlers
//!
//! The worker hands each accepted request's payload to a [`Handler`] chosen
//! by name from a [`HandlerRegistry`].

pub mod contract;
pub mod registry;

pub use contract::{Handler, HandlerContext, HandlerEnv};
pub use registry::{EchoHandler, HandlerRegistry};
