//! Pipeline stages

use agent_core::Agent;
use std::collections::BTreeSet;
use std::sync::Arc;

/// One step of a pipeline
///
/// A parallel group runs its members concurrently; none of them may read
/// another member's output. A sequential step runs a single agent after every
/// earlier stage has finished.
#[derive(Clone)]
pub enum Stage {
    Parallel {
        name: String,
        agents: Vec<Arc<dyn Agent>>,
    },
    Sequential(Arc<dyn Agent>),
}

impl Stage {
    pub fn parallel(name: impl Into<String>, agents: Vec<Arc<dyn Agent>>) -> Self {
        Self::Parallel {
            name: name.into(),
            agents,
        }
    }

    pub fn sequential(agent: Arc<dyn Agent>) -> Self {
        Self::Sequential(agent)
    }

    /// Group name, or the agent's name for a sequential step
    pub fn name(&self) -> &str {
        match self {
            Self::Parallel { name, .. } => name,
            Self::Sequential(agent) => agent.name(),
        }
    }

    /// "parallel" or "sequential"
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Parallel { .. } => "parallel",
            Self::Sequential(_) => "sequential",
        }
    }

    /// Members of the stage
    pub fn agents(&self) -> &[Arc<dyn Agent>] {
        match self {
            Self::Parallel { agents, .. } => agents,
            Self::Sequential(agent) => std::slice::from_ref(agent),
        }
    }

    /// Keys written by this stage
    pub fn output_keys(&self) -> Vec<&str> {
        self.agents().iter().map(|a| a.output_key()).collect()
    }

    /// Keys read by any member of this stage
    pub fn reads(&self) -> BTreeSet<&str> {
        self.agents()
            .iter()
            .flat_map(|a| a.spec().reads().iter().map(String::as_str))
            .collect()
    }
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.agents().iter().map(|a| a.name()).collect();
        f.debug_struct("Stage")
            .field("kind", &self.kind())
            .field("name", &self.name())
            .field("agents", &names)
            .finish()
    }
}
