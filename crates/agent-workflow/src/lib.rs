//! Multi-agent pipelines over a shared, write-once state store
//!
//! A [`Pipeline`] is an ordered list of [`Stage`]s: parallel groups of
//! independent agents and sequential steps that read what earlier stages
//! wrote. The [`Runner`] executes a pipeline for one query and produces a
//! [`RunSession`] with the final state, the event log and any agent failures.

pub mod events;
pub mod pipeline;
pub mod runner;
pub mod scheduler;
pub mod stage;

pub use events::{EventType, PipelineEvent};
pub use pipeline::{AgentPlan, Pipeline, PipelineBuilder, PipelinePlan, StagePlan};
pub use runner::{RunOutcome, RunSession, RunSummary, Runner};
pub use scheduler::AgentFailureRecord;
pub use stage::Stage;
