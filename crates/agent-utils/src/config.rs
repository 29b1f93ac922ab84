//! Environment configuration helpers
//!
//! Provider credentials are opaque bearer strings. They are wrapped in
//! [`Secret`] so they never show up in `Debug` output or logs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque credential (API key, client secret, access token)
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Wrap a raw credential string
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the raw value, e.g. to attach it to an outbound request
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the credential is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Read an environment variable, treating empty or whitespace-only values as unset
pub fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read an environment variable or fall back to a default
pub fn env_or(name: &str, default: &str) -> String {
    env_var(name).unwrap_or_else(|| default.to_string())
}

/// Read a credential from the environment
pub fn env_secret(name: &str) -> Option<Secret> {
    env_var(name).map(Secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_debug_is_redacted() {
        let secret = Secret::new("sk-very-secret");
        assert_eq!(format!("{secret:?}"), "Secret(***)");
        assert_eq!(secret.expose(), "sk-very-secret");
    }

    #[test]
    fn test_empty_env_var_is_unset() {
        unsafe {
            std::env::set_var("AGENT_UTILS_TEST_EMPTY", "   ");
        }
        assert_eq!(env_var("AGENT_UTILS_TEST_EMPTY"), None);
        assert_eq!(env_or("AGENT_UTILS_TEST_EMPTY", "fallback"), "fallback");
        unsafe {
            std::env::remove_var("AGENT_UTILS_TEST_EMPTY");
        }
    }

    #[test]
    fn test_env_secret() {
        unsafe {
            std::env::set_var("AGENT_UTILS_TEST_SECRET", "token-123");
        }
        let secret = env_secret("AGENT_UTILS_TEST_SECRET");
        assert_eq!(secret.map(|s| s.expose().to_string()), Some("token-123".to_string()));
        unsafe {
            std::env::remove_var("AGENT_UTILS_TEST_SECRET");
        }
    }
}
