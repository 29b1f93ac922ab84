//! Core Agent trait definition

use crate::{AgentEventHandler, AgentSpec, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Record of one capability call made during an invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityInvocation {
    /// Capability name as requested by the executor
    pub capability: String,
    /// Arguments as requested (before default filling)
    pub arguments: Value,
    /// Result document or error document
    pub result: Value,
    /// Whether `result` is an error document
    pub is_error: bool,
    pub duration_ms: u64,
}

/// The single structured result of an agent invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentOutput {
    /// Document written under the agent's output key
    pub document: Value,
    /// Capability calls made while producing it, in issue order
    pub trace: Vec<CapabilityInvocation>,
}

impl AgentOutput {
    pub fn new(document: Value) -> Self {
        Self {
            document,
            trace: Vec::new(),
        }
    }

    pub fn with_trace(mut self, trace: Vec<CapabilityInvocation>) -> Self {
        self.trace = trace;
        self
    }
}

/// Core trait that all agents must implement
///
/// An agent runs to completion and produces exactly one document per
/// invocation. It never touches the state store: the scheduler builds the
/// [`Context`] and writes the returned document.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Immutable definition of this agent
    fn spec(&self) -> &AgentSpec;

    /// Get the agent's name
    fn name(&self) -> &str {
        self.spec().name()
    }

    /// State key the agent's document is stored under
    fn output_key(&self) -> &str {
        self.spec().output_key()
    }

    /// Run the agent against a context
    ///
    /// Returns [`Error::AgentFailure`](crate::Error::AgentFailure) when no
    /// well-formed document could be produced.
    async fn invoke(
        &self,
        context: &Context,
        events: &dyn AgentEventHandler,
    ) -> Result<AgentOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NoOpEventHandler;
    use serde_json::json;

    struct EchoAgent {
        spec: AgentSpec,
    }

    #[async_trait]
    impl Agent for EchoAgent {
        fn spec(&self) -> &AgentSpec {
            &self.spec
        }

        async fn invoke(
            &self,
            context: &Context,
            _events: &dyn AgentEventHandler,
        ) -> Result<AgentOutput> {
            Ok(AgentOutput::new(json!({ "echo": context.query() })))
        }
    }

    #[tokio::test]
    async fn test_default_accessors_delegate_to_spec() {
        let agent = EchoAgent {
            spec: AgentSpec::builder("echo").output_key("echoed").build().unwrap(),
        };

        assert_eq!(agent.name(), "echo");
        assert_eq!(agent.output_key(), "echoed");

        let out = agent
            .invoke(&Context::from_query("hi"), &NoOpEventHandler)
            .await
            .unwrap();
        assert_eq!(out.document, json!({ "echo": "hi" }));
        assert!(out.trace.is_empty());
    }
}
