//! Agent runtime: executors and the agents built on them
//!
//! This crate provides the runtime infrastructure for executing agents:
//! the pluggable [`AgentExecutor`] (an LLM tool-call loop or a scripted stub),
//! the [`ToolAgent`] that binds an agent spec to capabilities and an
//! executor, and the [`AgentRuntime`] factory that builds agents from specs.

pub mod agents;
pub mod executor;
pub mod llm;
pub mod output;
pub mod runtime;
pub mod scripted;

pub use agents::ToolAgent;
pub use executor::{AgentExecutor, Invocation};
pub use llm::{ExecutorConfig, LlmExecutor, LlmExecutorBuilder};
pub use output::extract_document;
pub use runtime::{AgentRuntime, AgentRuntimeBuilder};
pub use scripted::{Outcome, RecordedInvocation, Script, ScriptedExecutor};
