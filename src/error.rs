//! Error types
//!
//! One enum per concern, aggregated into [`ApiError`] for the CLI and the
//! start-up path. Steady-state worker errors never escape the worker loop;
//! they are logged and reported instead.

use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to parse an agent card document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    /// 1-based line number in the source text
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// A parsed card that cannot be turned into an agent profile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("card root must be a mapping")]
    NotAMapping,

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("invalid handle '{0}': expected a lowercase slug such as 'demo-agent'")]
    InvalidHandle(String),
}

/// Any failure talking to the exchange: network, timeout, or non-2xx.
#[derive(Debug, Clone, Error)]
pub struct TransportError {
    pub message: String,
    /// HTTP status for non-2xx responses
    pub status: Option<u16>,
    /// Machine-readable code from the error body, or a local code such as `timeout`
    pub code: Option<String>,
    /// Parsed error body, if any
    pub body: Option<Value>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            code: None,
            body: None,
        }
    }

    pub fn with_code(message: impl Into<String>, code: &str) -> Self {
        Self {
            code: Some(code.to_string()),
            ..Self::new(message)
        }
    }

    /// Build an error from a non-2xx response, pulling the message and code
    /// out of the body when the service supplied them.
    pub fn from_response(status: u16, body: Option<Value>) -> Self {
        let field = |key: &str| {
            body.as_ref()
                .and_then(|b| b.get(key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        let message = field("error")
            .or_else(|| field("message"))
            .or_else(|| field("detail"))
            .unwrap_or_else(|| "API request failed".to_string());
        Self {
            message,
            status: Some(status),
            code: field("code"),
            body,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.code.as_deref() == Some("timeout")
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(status) = self.status {
            write!(f, "[{}] ", status)?;
        }
        if let Some(code) = &self.code {
            write!(f, "({}) ", code)?;
        }
        write!(f, "{}", self.message)
    }
}

/// Local persistence failures (memory store, config files).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Crate-level error surfaced by the CLI and start-up path.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Agent card parse error: {0}")]
    Parse(#[from] ParseError),

    /// A card file that failed to parse, with the file it came from.
    #[error("Agent card parse error in {}: {source}", .path.display())]
    CardParse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("Agent card error: {0}")]
    Profile(#[from] ProfileError),

    #[error("Exchange error: {0}")]
    Transport(#[from] TransportError),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(String),

    /// An operation that needs an API key was attempted without one.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
