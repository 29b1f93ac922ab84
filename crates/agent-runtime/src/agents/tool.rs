//! Tool agent implementation (wraps an AgentExecutor)

use crate::executor::{AgentExecutor, Invocation};
use agent_core::{Agent, AgentEventHandler, AgentOutput, AgentSpec, Context, Error, Result};
use agent_tools::CapabilityRegistry;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// An agent bound to a spec, a capability subset and an executor
///
/// The instruction is rendered against the invocation context and handed to
/// the executor. Every failure leaves this agent as an
/// [`Error::AgentFailure`] naming it, so the scheduler can treat it as
/// non-fatal.
pub struct ToolAgent {
    spec: AgentSpec,
    capabilities: CapabilityRegistry,
    executor: Arc<dyn AgentExecutor>,
}

impl ToolAgent {
    /// Create a tool agent
    ///
    /// `capabilities` must already be narrowed to what the spec declares, see
    /// [`AgentRuntime::create_agent`](crate::AgentRuntime::create_agent).
    pub fn new(
        spec: AgentSpec,
        capabilities: CapabilityRegistry,
        executor: Arc<dyn AgentExecutor>,
    ) -> Self {
        Self {
            spec,
            capabilities,
            executor,
        }
    }

    /// Capabilities this agent may call
    pub fn capabilities(&self) -> &CapabilityRegistry {
        &self.capabilities
    }
}

impl std::fmt::Debug for ToolAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolAgent")
            .field("name", &self.spec.name())
            .field("output_key", &self.spec.output_key())
            .field("capabilities", &self.capabilities.names())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Agent for ToolAgent {
    fn spec(&self) -> &AgentSpec {
        &self.spec
    }

    async fn invoke(
        &self,
        context: &Context,
        events: &dyn AgentEventHandler,
    ) -> Result<AgentOutput> {
        let name = self.spec.name();
        let instruction = self
            .spec
            .instruction()
            .render(context)
            .map_err(|e| Error::agent_failure(name, e.to_string()))?;

        let absent: Vec<&str> = context.keys().filter(|k| context.is_absent(k)).collect();
        if !absent.is_empty() {
            debug!(agent = %name, absent = ?absent, "Invoking with missing upstream data");
        }

        let invocation = Invocation {
            agent: name,
            model: self.spec.model(),
            instruction: &instruction,
            query: context.query(),
            capabilities: &self.capabilities,
            events,
        };

        self.executor.execute(invocation).await.map_err(|e| match e {
            Error::AgentFailure { .. } => e,
            other => {
                warn!(agent = %name, error = %other, "Executor error");
                Error::agent_failure(name, other.to_string())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::{Script, ScriptedExecutor};
    use agent_core::{NoOpEventHandler, Slot};
    use serde_json::json;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_instruction_is_rendered_with_context() {
        let executor = Arc::new(
            ScriptedExecutor::new().script("trend", Script::new().respond(json!({"trend": "UP"}))),
        );
        let spec = AgentSpec::builder("trend")
            .instruction("News: {{ news_data }}")
            .output_key("trend_analysis")
            .build()
            .unwrap();
        let agent = ToolAgent::new(spec, CapabilityRegistry::new(), executor.clone());

        let mut inputs = BTreeMap::new();
        inputs.insert("news_data".to_string(), Slot::Absent);
        let ctx = Context::new("q", inputs);

        let out = agent.invoke(&ctx, &NoOpEventHandler).await.unwrap();
        assert_eq!(out.document["trend"], "UP");

        let recorded = executor.recorded_for("trend").unwrap();
        assert!(recorded.instruction.starts_with("News: NO DATA"));
    }

    #[tokio::test]
    async fn test_render_error_is_agent_failure() {
        let executor = Arc::new(ScriptedExecutor::new());
        let spec = AgentSpec::builder("a")
            .instruction("{{ k1 }}")
            .output_key("k2")
            .build()
            .unwrap();
        let agent = ToolAgent::new(spec, CapabilityRegistry::new(), executor);

        let err = agent
            .invoke(&Context::from_query("q"), &NoOpEventHandler)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AgentFailure { ref agent, .. } if agent == "a"));
    }
}
