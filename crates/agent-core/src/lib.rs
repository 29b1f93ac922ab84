//! Core abstractions for agent pipelines
//!
//! This crate defines the fundamental traits and types shared by every other
//! crate in the workspace:
//!
//! - [`Agent`]: a named actor bound to an instruction, a capability subset and
//!   an output key
//! - [`StateStore`]: the per-run, write-once document arena agents communicate
//!   through
//! - [`Context`]: the rendered view of the store an agent is invoked with
//! - [`InstructionTemplate`]: instruction text that references other agents'
//!   output keys

pub mod agent;
pub mod context;
pub mod error;
pub mod events;
pub mod spec;
pub mod state;
pub mod template;

pub use agent::{Agent, AgentOutput, CapabilityInvocation};
pub use context::{Context, NO_DATA, Slot};
pub use error::{Error, Result};
pub use events::{AgentEventHandler, NoOpEventHandler};
pub use spec::{AgentSpec, AgentSpecBuilder};
pub use state::StateStore;
pub use template::{InstructionTemplate, QUERY_VAR};
