//! Immutable agent definitions

use crate::{Error, InstructionTemplate, Result};
use std::collections::{BTreeSet, HashSet};

/// Declarative description of an agent
///
/// An `AgentSpec` names the agent, fixes its instruction, lists the
/// capabilities it may call and the state key it writes. It is immutable once
/// built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSpec {
    name: String,
    description: String,
    instruction: InstructionTemplate,
    capabilities: Vec<String>,
    output_key: String,
    model: Option<String>,
}

impl AgentSpec {
    /// Start building a spec
    pub fn builder(name: impl Into<String>) -> AgentSpecBuilder {
        AgentSpecBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn instruction(&self) -> &InstructionTemplate {
        &self.instruction
    }

    /// Capability names, in declaration order
    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    pub fn output_key(&self) -> &str {
        &self.output_key
    }

    /// Opaque model reference; `None` means the executor's default
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// State keys the instruction reads
    pub fn reads(&self) -> &BTreeSet<String> {
        self.instruction.referenced_keys()
    }

    /// Copy of this spec restricted to the given capabilities
    ///
    /// Used when some declared capabilities are unavailable in the current
    /// environment. Declaration order is kept.
    pub fn with_capabilities_retained(&self, available: &HashSet<&str>) -> Self {
        let mut spec = self.clone();
        spec.capabilities
            .retain(|name| available.contains(name.as_str()));
        spec
    }
}

/// Builder for [`AgentSpec`]
#[derive(Debug, Default)]
pub struct AgentSpecBuilder {
    name: String,
    description: String,
    instruction: Option<String>,
    capabilities: Vec<String>,
    output_key: Option<String>,
    model: Option<String>,
}

impl AgentSpecBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Instruction template text, see [`InstructionTemplate`]
    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    /// Bind one capability by name
    pub fn capability(mut self, name: impl Into<String>) -> Self {
        self.capabilities.push(name.into());
        self
    }

    /// Bind several capabilities by name
    pub fn capabilities<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn output_key(mut self, key: impl Into<String>) -> Self {
        self.output_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Validate and build
    pub fn build(self) -> Result<AgentSpec> {
        if self.name.trim().is_empty() {
            return Err(Error::Configuration("agent name must not be empty".into()));
        }

        let output_key = self
            .output_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::Configuration(format!("agent '{}' has no output key", self.name))
            })?;

        let instruction = InstructionTemplate::new(self.instruction.unwrap_or_default())
            .map_err(|e| {
                Error::Configuration(format!("agent '{}' instruction: {e}", self.name))
            })?;

        if instruction.referenced_keys().contains(&output_key) {
            return Err(Error::Configuration(format!(
                "agent '{}' reads its own output key '{output_key}'",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for cap in &self.capabilities {
            if !seen.insert(cap.as_str()) {
                return Err(Error::Configuration(format!(
                    "agent '{}' binds capability '{cap}' twice",
                    self.name
                )));
            }
        }

        Ok(AgentSpec {
            name: self.name,
            description: self.description,
            instruction,
            capabilities: self.capabilities,
            output_key,
            model: self.model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_spec() {
        let spec = AgentSpec::builder("trend")
            .description("Combines upstream signals")
            .instruction("Use {{ k1 }} and {{ k2 }} for {{ query }}")
            .output_key("k3")
            .model("gemini-2.0-flash")
            .build()
            .unwrap();

        assert_eq!(spec.name(), "trend");
        assert_eq!(spec.output_key(), "k3");
        assert_eq!(spec.model(), Some("gemini-2.0-flash"));
        assert_eq!(spec.reads().len(), 2);
        assert!(spec.capabilities().is_empty());
    }

    #[test]
    fn test_missing_output_key() {
        let err = AgentSpec::builder("a").instruction("x").build().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_empty_name() {
        let err = AgentSpec::builder("  ").output_key("k").build().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_duplicate_capability() {
        let err = AgentSpec::builder("a")
            .output_key("k")
            .capabilities(["get_stock_quote", "get_stock_quote"])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("twice"));
    }

    #[test]
    fn test_self_read_is_rejected() {
        let err = AgentSpec::builder("a")
            .instruction("{{ k }}")
            .output_key("k")
            .build()
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_retain_capabilities_keeps_order() {
        let spec = AgentSpec::builder("a")
            .output_key("k")
            .capabilities(["c1", "c2", "c3"])
            .build()
            .unwrap();

        let available: HashSet<&str> = ["c3", "c1"].into_iter().collect();
        let narrowed = spec.with_capabilities_retained(&available);
        assert_eq!(narrowed.capabilities(), ["c1".to_string(), "c3".to_string()]);
    }
}
