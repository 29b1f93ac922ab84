//! Error types for market data providers

use agent_tools::CapabilityError;
use thiserror::Error;

/// Market data specific errors
#[derive(Debug, Error)]
pub enum MarketError {
    /// Connection, DNS or body read failure
    #[error("{provider} request failed: {message}")]
    Transport {
        provider: &'static str,
        message: String,
    },

    /// Provider answered with a non-success status
    #[error("{provider} API error {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    /// Rate limit exceeded at the provider
    #[error("Rate limit exceeded for {provider}")]
    RateLimited { provider: &'static str },

    /// Payload could not be understood
    #[error("Failed to parse {provider} response: {message}")]
    Parse {
        provider: &'static str,
        message: String,
    },

    /// Credential needed for a call is not configured
    #[error("{0} is not set")]
    MissingCredential(&'static str),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MarketError {
    pub(crate) fn transport(provider: &'static str, err: &reqwest::Error) -> Self {
        Self::Transport {
            provider,
            message: err.to_string(),
        }
    }

    pub(crate) fn parse(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Parse {
            provider,
            message: message.into(),
        }
    }
}

/// Result type alias for market data operations
pub type Result<T> = std::result::Result<T, MarketError>;

impl From<MarketError> for CapabilityError {
    fn from(err: MarketError) -> Self {
        match err {
            MarketError::Transport { .. } => CapabilityError::Transport(err.to_string()),
            _ => CapabilityError::Upstream(err.to_string()),
        }
    }
}

impl From<MarketError> for agent_core::Error {
    fn from(err: MarketError) -> Self {
        match err {
            MarketError::Config(msg) => agent_core::Error::Configuration(msg),
            MarketError::MissingCredential(name) => {
                agent_core::Error::Configuration(format!("{name} is not set"))
            }
            other => agent_core::Error::ProcessingFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MarketError::Status {
            provider: "Finnhub",
            status: 403,
            body: "You don't have access to this resource.".into(),
        };
        assert_eq!(
            err.to_string(),
            "Finnhub API error 403: You don't have access to this resource."
        );
        assert_eq!(
            MarketError::RateLimited { provider: "FRED" }.to_string(),
            "Rate limit exceeded for FRED"
        );
    }

    #[test]
    fn test_capability_error_kinds() {
        let transport: CapabilityError = MarketError::Transport {
            provider: "Reddit",
            message: "connection refused".into(),
        }
        .into();
        assert_eq!(transport.kind(), "transport");

        let upstream: CapabilityError = MarketError::parse("Marketaux", "expected object").into();
        assert_eq!(upstream.kind(), "upstream");

        let limited: CapabilityError = MarketError::RateLimited { provider: "Finnhub" }.into();
        assert_eq!(limited.kind(), "upstream");
    }

    #[test]
    fn test_core_error_conversion() {
        let err: agent_core::Error = MarketError::MissingCredential("FINNHUB_API_KEY").into();
        assert!(err.is_configuration());

        let err: agent_core::Error = MarketError::parse("FRED", "bad").into();
        assert!(matches!(err, agent_core::Error::ProcessingFailed(_)));
    }
}
