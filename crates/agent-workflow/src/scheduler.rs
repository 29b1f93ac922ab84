//! Stage execution
//!
//! A stage completes when each member has either written its key or failed.
//! Members of a parallel group are polled concurrently and never observe each
//! other; a failed member leaves its key absent and the rest carry on.

use crate::events::{EventType, RunEvents};
use crate::stage::Stage;
use agent_core::{Agent, StateStore};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// An agent that produced no document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentFailureRecord {
    pub agent: String,
    pub output_key: String,
    pub reason: String,
}

/// Run every member of `stage` and write their documents
pub(crate) async fn run_stage(
    stage: &Stage,
    query: &str,
    store: &StateStore,
    events: &RunEvents,
) -> Vec<AgentFailureRecord> {
    info!(
        stage = %stage.name(),
        kind = stage.kind(),
        agents = stage.agents().len(),
        "Stage started"
    );

    let results = match stage {
        Stage::Sequential(agent) => vec![run_agent(agent, stage.name(), query, store, events).await],
        Stage::Parallel { agents, .. } => {
            join_all(
                agents
                    .iter()
                    .map(|agent| run_agent(agent, stage.name(), query, store, events)),
            )
            .await
        }
    };

    let failures: Vec<AgentFailureRecord> = results.into_iter().flatten().collect();
    info!(
        stage = %stage.name(),
        failures = failures.len(),
        "Stage finished"
    );
    failures
}

async fn run_agent(
    agent: &Arc<dyn Agent>,
    stage: &str,
    query: &str,
    store: &StateStore,
    events: &RunEvents,
) -> Option<AgentFailureRecord> {
    let name = agent.name();
    let key = agent.output_key();
    let context = store.context_for(query, agent.spec().reads().iter().map(String::as_str));
    let absent: Vec<&str> = context.keys().filter(|k| context.is_absent(k)).collect();

    events.emit(
        name,
        EventType::Start,
        json!({
            "stage": stage,
            "output_key": key,
            "reads": context.keys().collect::<Vec<_>>(),
            "missing": absent,
        }),
    );

    let started = Instant::now();
    let outcome = agent
        .invoke(&context, events)
        .await
        .and_then(|output| {
            let calls = output.trace.len();
            store.write(key, output.document).map(|()| calls)
        });
    let duration_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(tool_calls) => {
            info!(agent = %name, output_key = %key, duration_ms, "Agent completed");
            events.emit(
                name,
                EventType::End,
                json!({
                    "status": "completed",
                    "output_key": key,
                    "tool_calls": tool_calls,
                    "duration_ms": duration_ms,
                }),
            );
            None
        }
        Err(e) => {
            let reason = match &e {
                agent_core::Error::AgentFailure { reason, .. } => reason.clone(),
                other => other.to_string(),
            };
            warn!(agent = %name, output_key = %key, reason = %reason, "Agent failed");
            events.emit(
                name,
                EventType::End,
                json!({
                    "status": "failed",
                    "output_key": key,
                    "error": reason,
                    "duration_ms": duration_ms,
                }),
            );
            Some(AgentFailureRecord {
                agent: name.to_string(),
                output_key: key.to_string(),
                reason,
            })
        }
    }
}
