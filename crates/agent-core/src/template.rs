//! MiniJinja-backed instruction templates
//!
//! An agent's instruction may reference the output key of any earlier agent
//! with `{{ key }}`. The set of referenced keys is computed once at
//! construction and is what the pipeline validates stage ordering against.

use crate::{Context, Error, Result};
use minijinja::{Environment, UndefinedBehavior};
use std::collections::{BTreeMap, BTreeSet};

/// Reserved template variable holding the user's query; never a state key
pub const QUERY_VAR: &str = "query";

/// Parsed instruction text with its state-key references
///
/// # Example
///
/// ```
/// use agent_core::InstructionTemplate;
///
/// let tmpl = InstructionTemplate::new(
///     "Combine {{ news_data }} with {{ sentiment_data }} to answer: {{ query }}",
/// ).unwrap();
///
/// let keys: Vec<_> = tmpl.referenced_keys().iter().cloned().collect();
/// assert_eq!(keys, vec!["news_data", "sentiment_data"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionTemplate {
    source: String,
    referenced: BTreeSet<String>,
}

impl InstructionTemplate {
    /// Parse a template and collect the keys it references
    pub fn new(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let env = Environment::new();
        let tmpl = env
            .template_from_str(&source)
            .map_err(|e| Error::Template(e.to_string()))?;

        let referenced = tmpl
            .undeclared_variables(false)
            .into_iter()
            .filter(|var| var != QUERY_VAR)
            .collect();

        Ok(Self { source, referenced })
    }

    /// State keys this template reads
    pub fn referenced_keys(&self) -> &BTreeSet<String> {
        &self.referenced
    }

    /// Raw template text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render with the query and the context's referenced keys
    ///
    /// Absent keys render as the no-data marker. A variable that is neither
    /// `query` nor present in the context is a render error.
    pub fn render(&self, context: &Context) -> Result<String> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);

        let mut vars: BTreeMap<String, String> = context.rendered_inputs();
        vars.insert(QUERY_VAR.to_string(), context.query().to_string());

        env.render_str(&self.source, minijinja::Value::from_serialize(&vars))
            .map_err(|e| Error::Template(e.to_string()))
    }
}
