//! Pipeline runner
//!
//! The runner drives one execution per query: it creates a fresh state store,
//! runs the stages in order with a strict barrier between them, and returns
//! the completed [`RunSession`].

use crate::events::{PipelineEvent, RunEvents};
use crate::pipeline::Pipeline;
use crate::scheduler::{AgentFailureRecord, run_stage};
use agent_core::StateStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    Cancelled,
}

/// Everything one run produced
#[derive(Debug)]
pub struct RunSession {
    pub run_id: Uuid,
    pub query: String,
    pub store: StateStore,
    pub events: Vec<PipelineEvent>,
    pub failures: Vec<AgentFailureRecord>,
    pub outcome: RunOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    final_key: Option<String>,
}

impl RunSession {
    /// Declared keys that hold no document
    pub fn unwritten_keys(&self) -> Vec<String> {
        self.store.unwritten_keys().into_iter().collect()
    }

    /// Written documents, keyed by output key
    pub fn state(&self) -> BTreeMap<String, Value> {
        self.store.snapshot()
    }

    /// Document of the last stage, when it is a sequential step that succeeded
    pub fn final_output(&self) -> Option<Arc<Value>> {
        self.final_key.as_deref().and_then(|k| self.store.read(k))
    }

    pub fn is_cancelled(&self) -> bool {
        self.outcome == RunOutcome::Cancelled
    }

    /// Serializable summary of the run
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            run_id: self.run_id,
            query: self.query.clone(),
            state: self.state(),
            final_output: self.final_output().map(|v| v.as_ref().clone()),
            unwritten_keys: self.unwritten_keys(),
            failures: self.failures.clone(),
            outcome: self.outcome,
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }
}

/// Final report of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub query: String,
    pub state: BTreeMap<String, Value>,
    pub final_output: Option<Value>,
    pub unwritten_keys: Vec<String>,
    pub failures: Vec<AgentFailureRecord>,
    pub outcome: RunOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Executes a pipeline, one fresh session per query
#[derive(Debug, Clone)]
pub struct Runner {
    pipeline: Arc<Pipeline>,
}

impl Runner {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Run to completion
    pub async fn run(&self, query: &str) -> RunSession {
        self.execute(query, CancellationToken::new(), None).await
    }

    /// Run until completion or until `cancel` fires
    ///
    /// On cancellation the active stage's futures are dropped; keys written
    /// before that point are kept.
    pub async fn run_with_cancel(&self, query: &str, cancel: CancellationToken) -> RunSession {
        self.execute(query, cancel, None).await
    }

    /// Run in a background task, streaming events as they happen
    ///
    /// The receiver yields every event of the run and closes once the session
    /// is complete; the handle resolves to the session.
    pub fn run_streaming(
        &self,
        query: impl Into<String>,
        cancel: CancellationToken,
    ) -> (UnboundedReceiver<PipelineEvent>, JoinHandle<RunSession>) {
        let (tx, rx) = unbounded_channel();
        let runner = self.clone();
        let query = query.into();
        let handle = tokio::spawn(async move { runner.execute(&query, cancel, Some(tx)).await });
        (rx, handle)
    }

    async fn execute(
        &self,
        query: &str,
        cancel: CancellationToken,
        tx: Option<tokio::sync::mpsc::UnboundedSender<PipelineEvent>>,
    ) -> RunSession {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let store = StateStore::with_keys(self.pipeline.output_keys());
        let events = RunEvents::new(run_id, tx);
        let mut failures = Vec::new();
        let mut outcome = RunOutcome::Completed;

        info!(
            run_id = %run_id,
            pipeline = %self.pipeline.name(),
            stages = self.pipeline.stages().len(),
            "Run started"
        );

        for stage in self.pipeline.stages() {
            if cancel.is_cancelled() {
                outcome = RunOutcome::Cancelled;
                break;
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    warn!(run_id = %run_id, stage = %stage.name(), "Run cancelled during stage");
                    events.cancel_in_flight();
                    outcome = RunOutcome::Cancelled;
                    break;
                }
                stage_failures = run_stage(stage, query, &store, &events) => {
                    failures.extend(stage_failures);
                }
            }
        }

        let finished_at = Utc::now();
        info!(
            run_id = %run_id,
            outcome = ?outcome,
            written = store.len(),
            unwritten = store.unwritten_keys().len(),
            failures = failures.len(),
            duration_ms = (finished_at - started_at).num_milliseconds(),
            "Run finished"
        );

        RunSession {
            run_id,
            query: query.to_string(),
            store,
            events: events.into_log(),
            failures,
            outcome,
            started_at,
            finished_at,
            final_key: self.pipeline.final_key().map(str::to_string),
        }
    }
}
