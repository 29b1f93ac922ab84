//! Error types for agent-core

use thiserror::Error;

/// Result type alias for agent-core
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for agent and pipeline operations
#[derive(Error, Debug)]
pub enum Error {
    /// Generic error message
    #[error("{0}")]
    Generic(String),

    /// Agent or executor initialization failed
    #[error("Agent initialization failed: {0}")]
    InitializationFailed(String),

    /// Agent processing failed
    #[error("Agent processing failed: {0}")]
    ProcessingFailed(String),

    /// The agent could not produce a well-formed final document
    #[error("Agent '{agent}' failed: {reason}")]
    AgentFailure {
        /// Name of the failing agent
        agent: String,
        /// Human readable reason
        reason: String,
    },

    /// Invalid agent or pipeline configuration, detected at construction time
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A state key was written twice in the same run
    #[error("State key '{0}' has already been written in this run")]
    DuplicateKey(String),

    /// A state key was written that no agent in the pipeline declares
    #[error("State key '{0}' is not declared by the pipeline")]
    UnknownKey(String),

    /// Instruction template failed to parse or render
    #[error("Template error: {0}")]
    Template(String),

    /// The run was cancelled by the caller
    #[error("Run cancelled")]
    Cancelled,
}

impl Error {
    /// Shorthand for an [`Error::AgentFailure`]
    pub fn agent_failure(agent: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AgentFailure {
            agent: agent.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error is fatal at construction time
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
