//! Errors raised while talking to a model endpoint

use thiserror::Error;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Failure of a single model call
#[derive(Error, Debug)]
pub enum LLMError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// The endpoint rejected the credential (401/403)
    #[error("Invalid API key or authentication failed")]
    AuthenticationFailed,

    /// HTTP 429, with the response body
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The body parsed but did not hold a usable choice
    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl LLMError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimitExceeded(_) => true,
            Self::HttpError(e) => e.is_timeout() || e.is_connect(),
            Self::RequestFailed(msg) => msg.starts_with("HTTP 5"),
            _ => false,
        }
    }
}

impl From<LLMError> for agent_core::Error {
    fn from(err: LLMError) -> Self {
        match err {
            LLMError::ConfigurationError(msg) => Self::Configuration(msg),
            other => Self::ProcessingFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(LLMError::RateLimitExceeded("slow down".into()).is_transient());
        assert!(LLMError::RequestFailed("HTTP 503 Service Unavailable: x".into()).is_transient());
        assert!(!LLMError::AuthenticationFailed.is_transient());
        assert!(!LLMError::InvalidRequest("bad".into()).is_transient());
    }

    #[test]
    fn test_into_core_error() {
        let err: agent_core::Error = LLMError::ConfigurationError("no key".into()).into();
        assert!(err.is_configuration());

        let err: agent_core::Error = LLMError::AuthenticationFailed.into();
        assert!(matches!(err, agent_core::Error::ProcessingFailed(_)));
    }
}
