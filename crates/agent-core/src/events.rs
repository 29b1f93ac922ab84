//! Hooks for observing an agent while it runs

use crate::CapabilityInvocation;
use async_trait::async_trait;

/// Receives progress notifications from an agent invocation
///
/// All methods have no-op defaults, implement only what you need.
#[async_trait]
pub trait AgentEventHandler: Send + Sync {
    /// A capability call finished (successfully or with an error document)
    async fn on_tool_call(&self, _agent: &str, _call: &CapabilityInvocation) {}

    /// The model produced text
    async fn on_text(&self, _agent: &str, _text: &str) {}
}

/// Handler that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpEventHandler;

#[async_trait]
impl AgentEventHandler for NoOpEventHandler {}
