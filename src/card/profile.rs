//! Agent profile derived from a parsed card.
//!
//! The worker only needs the handle and the declared domains. Every other
//! field stays in the document and passes through to registration untouched.

use super::node::Node;
use super::parser::parse_document;
use crate::error::{ApiError, ProfileError};
use serde_json::Value;
use std::path::Path;

/// One entry of the card's `services` list.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSpec {
    pub id: Option<String>,
    pub domains: Vec<String>,
}

/// Identity and polling filter of the agent running this worker.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentProfile {
    pub handle: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub services: Vec<ServiceSpec>,
    /// Flattened domains of every service, in declaration order, duplicates kept
    pub domains: Vec<String>,
    document: Node,
}

/// `[a-z0-9]` followed by `[a-z0-9_-]*`.
pub fn is_valid_handle(handle: &str) -> bool {
    let mut chars = handle.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c.is_ascii_digit() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

fn domain_list(node: Option<&Node>) -> Vec<String> {
    match node {
        Some(Node::Sequence(items)) => items.iter().filter_map(Node::scalar_text).collect(),
        Some(other) => other.scalar_text().into_iter().collect(),
        None => Vec::new(),
    }
}

impl AgentProfile {
    /// Build a profile from a parsed card document.
    pub fn from_document(document: Node) -> Result<Self, ProfileError> {
        let map = document.as_mapping().ok_or(ProfileError::NotAMapping)?;

        let handle = map
            .get("handle")
            .and_then(Node::scalar_text)
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .ok_or(ProfileError::MissingField("handle"))?;
        if !is_valid_handle(&handle) {
            return Err(ProfileError::InvalidHandle(handle));
        }

        let services: Vec<ServiceSpec> = map
            .get("services")
            .and_then(Node::as_sequence)
            .unwrap_or(&[])
            .iter()
            .map(|service| ServiceSpec {
                id: service.get("id").and_then(Node::scalar_text),
                domains: domain_list(service.get("domains")),
            })
            .collect();
        let domains = services
            .iter()
            .flat_map(|s| s.domains.iter().cloned())
            .collect();

        Ok(Self {
            handle,
            name: map.get("name").and_then(Node::scalar_text),
            description: map.get("description").and_then(Node::scalar_text),
            services,
            domains,
            document,
        })
    }

    /// Parse card text into a profile.
    pub fn parse(text: &str) -> Result<Self, ApiError> {
        let document = parse_document(text)?;
        Ok(Self::from_document(document)?)
    }

    /// Read and parse a card file.
    pub fn load(path: &Path) -> Result<Self, ApiError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ApiError::ConfigError(format!(
                "Failed to read agent card {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&text).map_err(|e| match e {
            ApiError::Parse(source) => ApiError::CardParse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Distinct domains in first-seen order, used as the polling filter.
    pub fn polling_domains(&self) -> Vec<String> {
        let mut seen = Vec::with_capacity(self.domains.len());
        for domain in &self.domains {
            if !seen.contains(domain) {
                seen.push(domain.clone());
            }
        }
        seen
    }

    pub fn document(&self) -> &Node {
        &self.document
    }

    /// The full card as JSON, for registration.
    pub fn card_json(&self) -> Value {
        self.document.to_json()
    }
}
