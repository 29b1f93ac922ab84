//! Runtime holding the shared executor and capability registry
//!
//! The AgentRuntime turns [`AgentSpec`]s into runnable agents: it binds each
//! spec to the capabilities it declares and to the shared executor.

use crate::agents::ToolAgent;
use crate::executor::AgentExecutor;
use crate::llm::{ExecutorConfig, LlmExecutor};
use agent_core::{AgentSpec, Error, Result};
use agent_llm::LLMProvider;
use agent_tools::CapabilityRegistry;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Factory for agents sharing one executor and one capability registry
///
/// # Example
///
/// ```
/// use agent_core::AgentSpec;
/// use agent_runtime::{AgentRuntime, Script, ScriptedExecutor};
/// use agent_tools::CapabilityRegistry;
/// use serde_json::json;
/// use std::sync::Arc;
///
/// let runtime = AgentRuntime::builder()
///     .executor(Arc::new(
///         ScriptedExecutor::new().fallback(Script::new().respond(json!({"ok": true}))),
///     ))
///     .capabilities(CapabilityRegistry::new())
///     .build()
///     .unwrap();
///
/// let spec = AgentSpec::builder("trend_analysis_agent")
///     .instruction("Combine {{ news_data }}")
///     .output_key("trend_analysis")
///     .build()
///     .unwrap();
/// let agent = runtime.create_agent(spec).unwrap();
/// ```
#[derive(Clone)]
pub struct AgentRuntime {
    executor: Arc<dyn AgentExecutor>,
    capabilities: Arc<CapabilityRegistry>,
}

impl AgentRuntime {
    pub fn new(executor: Arc<dyn AgentExecutor>, capabilities: Arc<CapabilityRegistry>) -> Self {
        Self {
            executor,
            capabilities,
        }
    }

    /// Create a new runtime builder
    pub fn builder() -> AgentRuntimeBuilder {
        AgentRuntimeBuilder::new()
    }

    pub fn executor(&self) -> &Arc<dyn AgentExecutor> {
        &self.executor
    }

    pub fn capabilities(&self) -> &Arc<CapabilityRegistry> {
        &self.capabilities
    }

    /// Bind a spec to its capabilities and the shared executor
    ///
    /// A capability the registry has never heard of is a configuration error.
    /// A capability declared unavailable (missing credentials) is dropped from
    /// the agent with a warning.
    pub fn create_agent(&self, spec: AgentSpec) -> Result<ToolAgent> {
        let bound = self.capabilities.subset(spec.capabilities()).map_err(|e| {
            Error::Configuration(format!("agent '{}': {e}", spec.name()))
        })?;

        let spec = if bound.len() < spec.capabilities().len() {
            let available: HashSet<&str> = bound.names().iter().map(String::as_str).collect();
            let dropped: Vec<&str> = spec
                .capabilities()
                .iter()
                .map(String::as_str)
                .filter(|c| !available.contains(c))
                .collect();
            warn!(agent = %spec.name(), dropped = ?dropped, "Agent built without unavailable capabilities");
            spec.with_capabilities_retained(&available)
        } else {
            spec
        };

        info!(
            agent = %spec.name(),
            output_key = %spec.output_key(),
            capabilities = bound.len(),
            "Agent created"
        );
        Ok(ToolAgent::new(spec, bound, self.executor.clone()))
    }
}

impl std::fmt::Debug for AgentRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRuntime")
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

/// Builder for AgentRuntime
#[derive(Default)]
pub struct AgentRuntimeBuilder {
    executor: Option<Arc<dyn AgentExecutor>>,
    capabilities: Option<CapabilityRegistry>,
}

impl AgentRuntimeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific executor
    pub fn executor(mut self, executor: Arc<dyn AgentExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Use an [`LlmExecutor`] over `provider`
    pub fn provider(self, provider: Arc<dyn LLMProvider>, config: ExecutorConfig) -> Self {
        self.executor(Arc::new(LlmExecutor::new(provider, config)))
    }

    pub fn capabilities(mut self, registry: CapabilityRegistry) -> Self {
        self.capabilities = Some(registry);
        self
    }

    pub fn build(self) -> Result<AgentRuntime> {
        let executor = self
            .executor
            .ok_or_else(|| Error::InitializationFailed("Executor not set".to_string()))?;
        let capabilities = Arc::new(self.capabilities.unwrap_or_default());
        Ok(AgentRuntime::new(executor, capabilities))
    }
}
