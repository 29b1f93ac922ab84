//! Extraction of the final JSON document from model text

use regex::Regex;
use serde_json::Value;

/// Parse a model's final answer into a JSON object
///
/// Accepts a bare object, an object inside a fenced code block, or an object
/// surrounded by prose. Anything that is not a JSON object is rejected with a
/// message that can be fed back to the model.
pub fn extract_document(text: &str) -> Result<Value, String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err("the answer was empty".to_string());
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return require_object(value);
    }

    if let Some(fenced) = fenced_block(trimmed) {
        if let Ok(value) = serde_json::from_str::<Value>(fenced) {
            return require_object(value);
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str::<Value>(&trimmed[start..=end]) {
                return require_object(value);
            }
        }
    }

    Err("the answer did not contain a parseable JSON object".to_string())
}

fn fenced_block(text: &str) -> Option<&str> {
    let re = Regex::new(r"(?s)```(?:json|JSON)?\s*\n?(.*?)```").ok()?;
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

fn require_object(value: Value) -> Result<Value, String> {
    if value.is_object() {
        Ok(value)
    } else {
        Err(format!(
            "expected a JSON object, got {}",
            match value {
                Value::Array(_) => "an array",
                Value::String(_) => "a string",
                Value::Number(_) => "a number",
                Value::Bool(_) => "a boolean",
                _ => "null",
            }
        ))
    }
}
