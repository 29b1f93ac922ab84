//! Pluggable agent executors
//!
//! An [`AgentExecutor`] is what actually produces an agent's document: a
//! hosted model driving a tool-call loop ([`LlmExecutor`](crate::LlmExecutor))
//! or a deterministic script ([`ScriptedExecutor`](crate::ScriptedExecutor)).
//! Agents stay polymorphic over it.

use agent_core::{AgentEventHandler, AgentOutput, Result};
use agent_tools::CapabilityRegistry;
use async_trait::async_trait;

/// Everything an executor needs for one agent invocation
#[derive(Clone, Copy)]
pub struct Invocation<'a> {
    /// Name of the agent being invoked
    pub agent: &'a str,
    /// Model reference from the agent spec, if any
    pub model: Option<&'a str>,
    /// Instruction with every referenced key already substituted
    pub instruction: &'a str,
    /// The user's query
    pub query: &'a str,
    /// Capabilities the agent is bound to
    pub capabilities: &'a CapabilityRegistry,
    /// Sink for tool-call and text events
    pub events: &'a dyn AgentEventHandler,
}

impl std::fmt::Debug for Invocation<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invocation")
            .field("agent", &self.agent)
            .field("model", &self.model)
            .field("query", &self.query)
            .field("capabilities", &self.capabilities.names())
            .finish_non_exhaustive()
    }
}

/// Produces one document per invocation
///
/// Failures to produce a well-formed document are reported as
/// [`agent_core::Error::AgentFailure`].
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    async fn execute(&self, invocation: Invocation<'_>) -> Result<AgentOutput>;
}
