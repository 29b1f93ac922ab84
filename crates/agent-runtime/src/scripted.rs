//! Deterministic executor for offline runs and tests
//!
//! A [`ScriptedExecutor`] plays a fixed [`Script`] per agent: a list of
//! capability calls (dispatched through the real registry, so validation and
//! timeouts apply), optional delays, and a final outcome.

use crate::executor::{AgentExecutor, Invocation};
use agent_core::{AgentOutput, CapabilityInvocation, Error, Result};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
enum Step {
    Call { capability: String, args: Value },
    Sleep(Duration),
    Text(String),
}

/// How a script ends
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Return this document
    Document(Value),
    /// Return the capability results keyed by capability name
    Collect,
    /// Report an agent failure with this reason
    Fail(String),
}

/// Steps played for one agent
#[derive(Debug, Clone)]
pub struct Script {
    steps: Vec<Step>,
    outcome: Outcome,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            steps: Vec::new(),
            outcome: Outcome::Collect,
        }
    }
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatch a capability call
    pub fn call(mut self, capability: impl Into<String>, args: Value) -> Self {
        self.steps.push(Step::Call {
            capability: capability.into(),
            args,
        });
        self
    }

    /// Wait before the next step
    pub fn sleep(mut self, duration: Duration) -> Self {
        self.steps.push(Step::Sleep(duration));
        self
    }

    /// Emit model text
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.steps.push(Step::Text(text.into()));
        self
    }

    pub fn respond(mut self, document: Value) -> Self {
        self.outcome = Outcome::Document(document);
        self
    }

    pub fn collect(mut self) -> Self {
        self.outcome = Outcome::Collect;
        self
    }

    pub fn fail(mut self, reason: impl Into<String>) -> Self {
        self.outcome = Outcome::Fail(reason.into());
        self
    }
}

/// An invocation as seen by the scripted executor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedInvocation {
    pub agent: String,
    pub instruction: String,
    pub query: String,
    /// Capabilities bound at invocation time
    pub capabilities: Vec<String>,
}

/// Executor playing scripts keyed by agent name
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    scripts: HashMap<String, Script>,
    fallback: Option<Script>,
    recorded: Mutex<Vec<RecordedInvocation>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script for one agent
    pub fn script(mut self, agent: impl Into<String>, script: Script) -> Self {
        self.scripts.insert(agent.into(), script);
        self
    }

    /// Script for agents without their own
    pub fn fallback(mut self, script: Script) -> Self {
        self.fallback = Some(script);
        self
    }

    /// Invocations received so far, in arrival order
    pub fn recorded(&self) -> Vec<RecordedInvocation> {
        self.recorded
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Recorded invocation of one agent, if any
    pub fn recorded_for(&self, agent: &str) -> Option<RecordedInvocation> {
        self.recorded().into_iter().find(|r| r.agent == agent)
    }

    fn record(&self, inv: &Invocation<'_>) {
        if let Ok(mut guard) = self.recorded.lock() {
            guard.push(RecordedInvocation {
                agent: inv.agent.to_string(),
                instruction: inv.instruction.to_string(),
                query: inv.query.to_string(),
                capabilities: inv.capabilities.names().to_vec(),
            });
        }
    }
}

#[async_trait]
impl AgentExecutor for ScriptedExecutor {
    async fn execute(&self, inv: Invocation<'_>) -> Result<AgentOutput> {
        self.record(&inv);

        let script = self
            .scripts
            .get(inv.agent)
            .or(self.fallback.as_ref())
            .ok_or_else(|| Error::agent_failure(inv.agent, "no script for this agent"))?;

        let mut trace = Vec::new();
        for step in &script.steps {
            match step {
                Step::Sleep(duration) => tokio::time::sleep(*duration).await,
                Step::Text(text) => inv.events.on_text(inv.agent, text).await,
                Step::Call { capability, args } => {
                    // Calls to capabilities the agent lost at build time are skipped
                    if !inv.capabilities.contains(capability)
                        && inv.capabilities.unavailable_reason(capability).is_some()
                    {
                        debug!(agent = %inv.agent, capability = %capability, "Skipping unavailable capability");
                        continue;
                    }
                    let dispatched = inv.capabilities.dispatch(capability, args).await;
                    let record = CapabilityInvocation {
                        capability: capability.clone(),
                        arguments: args.clone(),
                        result: dispatched.result,
                        is_error: dispatched.is_error,
                        duration_ms: dispatched.duration.as_millis() as u64,
                    };
                    inv.events.on_tool_call(inv.agent, &record).await;
                    trace.push(record);
                }
            }
        }

        let document = match &script.outcome {
            Outcome::Fail(reason) => return Err(Error::agent_failure(inv.agent, reason.clone())),
            Outcome::Document(doc) => doc.clone(),
            Outcome::Collect => {
                let results: Map<String, Value> = trace
                    .iter()
                    .map(|call| (call.capability.clone(), call.result.clone()))
                    .collect();
                json!({ "query": inv.query, "results": results })
            }
        };

        Ok(AgentOutput::new(document).with_trace(trace))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::NoOpEventHandler;
    use agent_tools::{CapabilityRegistry, CapabilitySpec, FnCapability};
    use std::sync::Arc;

    fn registry() -> CapabilityRegistry {
        CapabilityRegistry::new()
            .with(Arc::new(FnCapability::constant(
                CapabilitySpec::new("get_market_news", "News"),
                json!({"count": 0, "articles": []}),
            )))
            .unwrap()
    }

    fn invocation<'a>(agent: &'a str, registry: &'a CapabilityRegistry) -> Invocation<'a> {
        Invocation {
            agent,
            model: None,
            instruction: "instr",
            query: "q",
            capabilities: registry,
            events: &NoOpEventHandler,
        }
    }

    #[tokio::test]
    async fn test_collect_outcome() {
        let executor = ScriptedExecutor::new()
            .script("news", Script::new().call("get_market_news", json!({})).collect());
        let registry = registry();

        let out = executor.execute(invocation("news", &registry)).await.unwrap();
        assert_eq!(out.document["results"]["get_market_news"]["count"], 0);
        assert_eq!(out.trace.len(), 1);
        assert_eq!(executor.recorded_for("news").unwrap().instruction, "instr");
    }

    #[tokio::test]
    async fn test_fail_outcome() {
        let executor = ScriptedExecutor::new().script("a", Script::new().fail("boom"));
        let registry = registry();

        let err = executor.execute(invocation("a", &registry)).await.unwrap_err();
        assert!(matches!(err, Error::AgentFailure { .. }));
    }

    #[tokio::test]
    async fn test_missing_script() {
        let executor = ScriptedExecutor::new();
        let registry = registry();
        assert!(executor.execute(invocation("x", &registry)).await.is_err());

        let executor = ScriptedExecutor::new().fallback(Script::new().respond(json!({"ok": true})));
        let out = executor.execute(invocation("x", &registry)).await.unwrap();
        assert_eq!(out.document, json!({"ok": true}));
    }
}
