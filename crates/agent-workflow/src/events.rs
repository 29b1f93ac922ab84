//! Run events
//!
//! Every agent start, capability call, piece of model text and agent
//! completion becomes a [`PipelineEvent`]. Events are appended to the run's
//! log and, for streaming runs, forwarded over a channel as they happen.

use agent_core::{AgentEventHandler, CapabilityInvocation};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeSet;
use std::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

/// Kind of a pipeline event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Start,
    ToolCall,
    Text,
    End,
}

/// One observable step of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineEvent {
    pub run_id: Uuid,
    pub agent_name: String,
    pub event_type: EventType,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

impl PipelineEvent {
    /// `status` of an `end` event ("completed", "failed" or "cancelled")
    pub fn status(&self) -> Option<&str> {
        match self.event_type {
            EventType::End => self.payload.get("status").and_then(Value::as_str),
            _ => None,
        }
    }
}

/// Event log and stream for one run
pub(crate) struct RunEvents {
    run_id: Uuid,
    log: Mutex<Vec<PipelineEvent>>,
    in_flight: Mutex<BTreeSet<String>>,
    tx: Option<UnboundedSender<PipelineEvent>>,
}

impl RunEvents {
    pub(crate) fn new(run_id: Uuid, tx: Option<UnboundedSender<PipelineEvent>>) -> Self {
        Self {
            run_id,
            log: Mutex::new(Vec::new()),
            in_flight: Mutex::new(BTreeSet::new()),
            tx,
        }
    }

    pub(crate) fn emit(&self, agent: &str, event_type: EventType, payload: Value) {
        if let Ok(mut in_flight) = self.in_flight.lock() {
            match event_type {
                EventType::Start => {
                    in_flight.insert(agent.to_string());
                }
                EventType::End => {
                    in_flight.remove(agent);
                }
                EventType::ToolCall | EventType::Text => {}
            }
        }

        let event = PipelineEvent {
            run_id: self.run_id,
            agent_name: agent.to_string(),
            event_type,
            payload,
            timestamp: Utc::now(),
        };

        if let Some(tx) = &self.tx {
            // A dropped receiver only stops streaming; the log stays complete
            let _ = tx.send(event.clone());
        }
        if let Ok(mut log) = self.log.lock() {
            log.push(event);
        }
    }

    /// Close every agent that started but never ended
    pub(crate) fn cancel_in_flight(&self) {
        let pending: Vec<String> = self
            .in_flight
            .lock()
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        for agent in pending {
            self.emit(&agent, EventType::End, json!({ "status": "cancelled" }));
        }
    }

    pub(crate) fn into_log(self) -> Vec<PipelineEvent> {
        self.log.into_inner().unwrap_or_default()
    }
}

#[async_trait]
impl AgentEventHandler for RunEvents {
    async fn on_tool_call(&self, agent: &str, call: &CapabilityInvocation) {
        let payload = serde_json::to_value(call).unwrap_or_else(|e| json!({ "error": e.to_string() }));
        self.emit(agent, EventType::ToolCall, payload);
    }

    async fn on_text(&self, agent: &str, text: &str) {
        self.emit(agent, EventType::Text, json!({ "text": text }));
    }
}
