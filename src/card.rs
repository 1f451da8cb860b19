//! Agent Card
//!
//! The agent card is the declarative description of an agent: its identity
//! and the services (with their domains) it offers. Cards are written in a
//! restricted YAML dialect parsed by [`parse_document`] and interpreted by
//! [`AgentProfile`].

pub mod node;
pub mod parser;
pub mod profile;
pub mod scalar;

pub use node::{Mapping, Node, Scalar};
pub use parser::parse_document;
pub use profile::{is_valid_handle, AgentProfile, ServiceSpec};
pub use scalar::decode_scalar;
