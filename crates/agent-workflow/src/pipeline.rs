//! Pipeline definition and construction-time validation

use crate::stage::Stage;
use agent_core::{Agent, Error, Result};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// An ordered, validated list of stages
///
/// A built pipeline is immutable and guarantees:
/// - at least one stage, and no empty stage
/// - pairwise distinct agent names and output keys
/// - every key an agent reads is written by a strictly earlier stage
///
/// # Example
///
/// ```
/// use agent_core::AgentSpec;
/// use agent_runtime::{AgentRuntime, ScriptedExecutor};
/// use agent_workflow::Pipeline;
/// use std::sync::Arc;
///
/// let runtime = AgentRuntime::builder()
///     .executor(Arc::new(ScriptedExecutor::new()))
///     .build()
///     .unwrap();
/// let agent = |name: &str, reads: &str, key: &str| {
///     let spec = AgentSpec::builder(name)
///         .instruction(reads)
///         .output_key(key)
///         .build()
///         .unwrap();
///     Arc::new(runtime.create_agent(spec).unwrap()) as Arc<dyn agent_core::Agent>
/// };
///
/// let pipeline = Pipeline::builder("demo")
///     .parallel("gather", vec![agent("a", "", "k1"), agent("b", "", "k2")])
///     .sequential(agent("c", "{{ k1 }} {{ k2 }}", "k3"))
///     .build()
///     .unwrap();
/// assert_eq!(pipeline.output_keys(), vec!["k1", "k2", "k3"]);
///
/// // Same-stage reads are rejected before anything runs
/// let err = Pipeline::builder("bad")
///     .parallel("gather", vec![agent("a", "", "k1"), agent("b", "{{ k1 }}", "k2")])
///     .build()
///     .unwrap_err();
/// assert!(err.is_configuration());
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    name: String,
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn builder(name: impl Into<String>) -> PipelineBuilder {
        PipelineBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Every agent, in stage order
    pub fn agents(&self) -> impl Iterator<Item = &Arc<dyn Agent>> {
        self.stages.iter().flat_map(Stage::agents)
    }

    /// Every output key, in stage order
    pub fn output_keys(&self) -> Vec<&str> {
        self.stages.iter().flat_map(Stage::output_keys).collect()
    }

    /// Output key of the last stage when it is a sequential step
    pub fn final_key(&self) -> Option<&str> {
        match self.stages.last() {
            Some(Stage::Sequential(agent)) => Some(agent.output_key()),
            _ => None,
        }
    }

    /// Serializable description of the pipeline
    pub fn plan(&self) -> PipelinePlan {
        PipelinePlan {
            name: self.name.clone(),
            stages: self
                .stages
                .iter()
                .map(|stage| StagePlan {
                    name: stage.name().to_string(),
                    kind: stage.kind(),
                    agents: stage
                        .agents()
                        .iter()
                        .map(|agent| {
                            let spec = agent.spec();
                            AgentPlan {
                                name: spec.name().to_string(),
                                description: spec.description().to_string(),
                                output_key: spec.output_key().to_string(),
                                reads: spec.reads().iter().cloned().collect(),
                                capabilities: spec.capabilities().to_vec(),
                            }
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Description of a pipeline, as printed by `plan`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelinePlan {
    pub name: String,
    pub stages: Vec<StagePlan>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagePlan {
    pub name: String,
    pub kind: &'static str,
    pub agents: Vec<AgentPlan>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentPlan {
    pub name: String,
    pub description: String,
    pub output_key: String,
    pub reads: Vec<String>,
    pub capabilities: Vec<String>,
}

/// Builder for [`Pipeline`]; all checks happen in [`build`](Self::build)
#[derive(Debug)]
pub struct PipelineBuilder {
    name: String,
    stages: Vec<Stage>,
}

impl PipelineBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
        }
    }

    /// Append a parallel group
    pub fn parallel(mut self, name: impl Into<String>, agents: Vec<Arc<dyn Agent>>) -> Self {
        self.stages.push(Stage::parallel(name, agents));
        self
    }

    /// Append a sequential step
    pub fn sequential(mut self, agent: Arc<dyn Agent>) -> Self {
        self.stages.push(Stage::sequential(agent));
        self
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn build(self) -> Result<Pipeline> {
        if self.stages.is_empty() {
            return Err(Error::Configuration(format!(
                "pipeline '{}' has no stages",
                self.name
            )));
        }

        let mut names = HashSet::new();
        // key -> index of the stage writing it
        let mut writers: HashMap<&str, usize> = HashMap::new();

        for (idx, stage) in self.stages.iter().enumerate() {
            if stage.agents().is_empty() {
                return Err(Error::Configuration(format!(
                    "stage '{}' has no agents",
                    stage.name()
                )));
            }
            for agent in stage.agents() {
                if !names.insert(agent.name()) {
                    return Err(Error::Configuration(format!(
                        "duplicate agent name '{}'",
                        agent.name()
                    )));
                }
                if writers.insert(agent.output_key(), idx).is_some() {
                    return Err(Error::Configuration(format!(
                        "duplicate output key '{}'",
                        agent.output_key()
                    )));
                }
            }
        }

        for (idx, stage) in self.stages.iter().enumerate() {
            for agent in stage.agents() {
                let reads: &BTreeSet<String> = agent.spec().reads();
                for key in reads {
                    match writers.get(key.as_str()) {
                        Some(&writer) if writer < idx => {}
                        Some(&writer) if writer == idx => {
                            return Err(Error::Configuration(format!(
                                "agent '{}' reads '{key}' which is written in its own stage",
                                agent.name()
                            )));
                        }
                        Some(_) => {
                            return Err(Error::Configuration(format!(
                                "agent '{}' reads '{key}' which is written by a later stage",
                                agent.name()
                            )));
                        }
                        None => {
                            return Err(Error::Configuration(format!(
                                "agent '{}' reads '{key}' which no agent writes",
                                agent.name()
                            )));
                        }
                    }
                }
            }
        }

        debug!(
            pipeline = %self.name,
            stages = self.stages.len(),
            agents = names.len(),
            "Pipeline validated"
        );
        Ok(Pipeline {
            name: self.name,
            stages: self.stages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::{AgentEventHandler, AgentOutput, AgentSpec, Context};
    use async_trait::async_trait;
    use serde_json::json;

    struct Fixed(AgentSpec);

    #[async_trait]
    impl Agent for Fixed {
        fn spec(&self) -> &AgentSpec {
            &self.0
        }

        async fn invoke(&self, _: &Context, _: &dyn AgentEventHandler) -> Result<AgentOutput> {
            Ok(AgentOutput::new(json!({})))
        }
    }

    fn agent(name: &str, instruction: &str, key: &str) -> Arc<dyn Agent> {
        Arc::new(Fixed(
            AgentSpec::builder(name)
                .instruction(instruction)
                .output_key(key)
                .build()
                .unwrap(),
        ))
    }

    fn build_err(builder: PipelineBuilder) -> String {
        let err = builder.build().unwrap_err();
        assert!(err.is_configuration());
        err.to_string()
    }

    #[test]
    fn test_valid_pipeline() {
        let pipeline = Pipeline::builder("p")
            .parallel("g", vec![agent("a", "", "k1"), agent("b", "", "k2")])
            .sequential(agent("c", "{{ k1 }}{{ k2 }}", "k3"))
            .sequential(agent("d", "{{ k3 }}{{ k1 }}", "k4"))
            .build()
            .unwrap();

        assert_eq!(pipeline.output_keys(), vec!["k1", "k2", "k3", "k4"]);
        assert_eq!(pipeline.final_key(), Some("k4"));
        assert_eq!(pipeline.agents().count(), 4);

        let plan = pipeline.plan();
        assert_eq!(plan.stages[0].kind, "parallel");
        assert_eq!(plan.stages[2].agents[0].reads, vec!["k1", "k3"]);
    }

    #[test]
    fn test_duplicate_output_key() {
        let msg = build_err(
            Pipeline::builder("p").parallel("g", vec![agent("a", "", "k1"), agent("b", "", "k1")]),
        );
        assert!(msg.contains("duplicate output key 'k1'"));
    }

    #[test]
    fn test_duplicate_agent_name() {
        let msg = build_err(
            Pipeline::builder("p")
                .sequential(agent("a", "", "k1"))
                .sequential(agent("a", "", "k2")),
        );
        assert!(msg.contains("duplicate agent name"));
    }

    #[test]
    fn test_same_stage_read() {
        let msg = build_err(
            Pipeline::builder("p")
                .parallel("g", vec![agent("a", "", "k1"), agent("b", "{{ k1 }}", "k2")]),
        );
        assert!(msg.contains("its own stage"));
    }

    #[test]
    fn test_forward_read() {
        let msg = build_err(
            Pipeline::builder("p")
                .sequential(agent("a", "{{ k2 }}", "k1"))
                .sequential(agent("b", "", "k2")),
        );
        assert!(msg.contains("later stage"));
    }

    #[test]
    fn test_unknown_read() {
        let msg = build_err(Pipeline::builder("p").sequential(agent("a", "{{ nope }}", "k1")));
        assert!(msg.contains("no agent writes"));
    }

    #[test]
    fn test_empty_pipeline_and_stage() {
        build_err(Pipeline::builder("p"));
        build_err(Pipeline::builder("p").parallel("g", vec![]));
    }
}
