//! Capability error types
//!
//! Capabilities never let a fault cross their boundary: every failure is
//! turned into a [`CapabilityError`] and then into an error document the
//! agent sees as an ordinary tool result.

use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;

/// Failure of a capability call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    /// Network failure, connection refused, DNS, body read
    #[error("Transport error: {0}")]
    Transport(String),

    /// Arguments did not match the capability's parameter schema
    #[error("Invalid arguments: {0}")]
    Validation(String),

    /// The call exceeded its deadline
    #[error("Timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// No capability with this name is bound
    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    /// The provider answered with an error status, a rate limit or a payload
    /// that could not be understood
    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl CapabilityError {
    /// Stable machine-readable kind, the `error_kind` field of the document
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Validation(_) => "validation",
            Self::Timeout(_) => "timeout",
            Self::UnknownCapability(_) => "unknown_capability",
            Self::Upstream(_) => "upstream",
        }
    }

    /// Error document returned to the agent in place of a result
    pub fn to_document(&self) -> Value {
        json!({
            "error": self.to_string(),
            "error_kind": self.kind(),
        })
    }
}

/// Whether a capability result is an error document
pub fn is_error_document(value: &Value) -> bool {
    value.get("error").is_some() && value.get("error_kind").is_some_and(Value::is_string)
}
