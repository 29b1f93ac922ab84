//! Invocation context for agents
//!
//! A `Context` is the read-only view an agent gets of the pipeline state: the
//! user's query plus the current value of every key its instruction refers
//! to. Keys that have not been produced are carried as [`Slot::Absent`] so the
//! instruction can see the gap instead of silently losing the reference.

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Text substituted for a referenced key that holds no document
pub const NO_DATA: &str = "NO DATA (the upstream agent produced no usable result)";

/// Value of a referenced state key at invocation time
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// The key has been written
    Present(Arc<Value>),
    /// The key has not been written
    Absent,
}

impl Slot {
    /// The document, if present
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Present(v) => Some(v),
            Self::Absent => None,
        }
    }

    /// Text form used when rendering instructions
    pub fn render(&self) -> String {
        match self {
            Self::Present(v) => match v.as_ref() {
                Value::String(s) => s.clone(),
                other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
            },
            Self::Absent => NO_DATA.to_string(),
        }
    }
}

/// Context passed to agents during invocation
///
/// # Example
///
/// ```
/// use agent_core::{Context, Slot};
/// use serde_json::json;
/// use std::collections::BTreeMap;
/// use std::sync::Arc;
///
/// let mut inputs = BTreeMap::new();
/// inputs.insert("news_data".to_string(), Slot::Present(Arc::new(json!({"mood": "RISK_ON"}))));
/// inputs.insert("sentiment_data".to_string(), Slot::Absent);
///
/// let ctx = Context::new("Analyze AAPL", inputs);
/// assert_eq!(ctx.query(), "Analyze AAPL");
/// assert!(ctx.is_absent("sentiment_data"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    query: String,
    inputs: BTreeMap<String, Slot>,
}

impl Context {
    /// Create a context from a query and the referenced key slots
    pub fn new(query: impl Into<String>, inputs: BTreeMap<String, Slot>) -> Self {
        Self {
            query: query.into(),
            inputs,
        }
    }

    /// Context carrying only the query
    pub fn from_query(query: impl Into<String>) -> Self {
        Self::new(query, BTreeMap::new())
    }

    /// The user's natural-language query
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Slot for a referenced key
    pub fn get(&self, key: &str) -> Option<&Slot> {
        self.inputs.get(key)
    }

    /// Document for a referenced key, if it was written
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.inputs.get(key).and_then(Slot::value)
    }

    /// Whether a referenced key is carried with the no-data marker
    pub fn is_absent(&self, key: &str) -> bool {
        matches!(self.inputs.get(key), Some(Slot::Absent))
    }

    /// Referenced keys, in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.inputs.keys().map(String::as_str)
    }

    /// Referenced keys and their slots
    pub fn inputs(&self) -> &BTreeMap<String, Slot> {
        &self.inputs
    }

    /// Text form of every referenced key, for template rendering
    pub fn rendered_inputs(&self) -> BTreeMap<String, String> {
        self.inputs
            .iter()
            .map(|(k, slot)| (k.clone(), slot.render()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_slot_renders_marker() {
        assert_eq!(Slot::Absent.render(), NO_DATA);
        assert!(Slot::Absent.value().is_none());
    }

    #[test]
    fn test_present_slot_renders_json() {
        let slot = Slot::Present(Arc::new(json!({"a": 1})));
        assert!(slot.render().contains("\"a\": 1"));

        let text = Slot::Present(Arc::new(json!("plain")));
        assert_eq!(text.render(), "plain");
    }

    #[test]
    fn test_lookup() {
        let mut inputs = BTreeMap::new();
        inputs.insert("k1".to_string(), Slot::Absent);
        inputs.insert("k2".to_string(), Slot::Present(Arc::new(json!(2))));
        let ctx = Context::new("q", inputs);

        assert!(ctx.is_absent("k1"));
        assert!(!ctx.is_absent("k2"));
        assert!(!ctx.is_absent("missing"));
        assert_eq!(ctx.value("k2"), Some(&json!(2)));
        assert_eq!(ctx.rendered_inputs()["k1"], NO_DATA);
    }
}
