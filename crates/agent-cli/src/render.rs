//! Console rendering of run events and results

use agent_workflow::{EventType, PipelineEvent, PipelinePlan, RunSession};
use serde_json::Value;

/// Longest state preview printed after a run
pub const PREVIEW_CHARS: usize = 200;

const RULE: &str = "============================================================";

/// Prints streamed events, announcing each agent switch once
#[derive(Debug, Default)]
pub struct EventPrinter {
    current_agent: Option<String>,
}

impl EventPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines for one event, in print order
    pub fn lines(&mut self, event: &PipelineEvent) -> Vec<String> {
        let mut lines = Vec::new();
        if self.current_agent.as_deref() != Some(event.agent_name.as_str()) {
            self.current_agent = Some(event.agent_name.clone());
            lines.push(String::new());
            lines.push(format!("[{}]", event.agent_name));
        }

        match event.event_type {
            EventType::Start => {
                let missing = event.payload["missing"]
                    .as_array()
                    .map(|keys| keys.iter().filter_map(Value::as_str).collect::<Vec<_>>())
                    .unwrap_or_default();
                if !missing.is_empty() {
                    lines.push(format!("  inputs without data: {}", missing.join(", ")));
                }
            }
            EventType::ToolCall => {
                let capability = event.payload["capability"].as_str().unwrap_or("?");
                let marker = if event.payload["is_error"].as_bool().unwrap_or(false) {
                    " (error)"
                } else {
                    ""
                };
                lines.push(format!("  tool: {capability}{marker}"));
            }
            EventType::Text => {
                if let Some(text) = event.payload["text"].as_str() {
                    let text = text.trim();
                    if !text.is_empty() {
                        lines.push(format!("  {}", preview(text, PREVIEW_CHARS)));
                    }
                }
            }
            EventType::End => match event.status() {
                Some("failed") => lines.push(format!(
                    "  failed: {}",
                    event.payload["error"].as_str().unwrap_or("unknown error")
                )),
                Some(status) => lines.push(format!("  {status}")),
                None => {}
            },
        }
        lines
    }

    pub fn print(&mut self, event: &PipelineEvent) {
        for line in self.lines(event) {
            println!("{line}");
        }
    }
}

/// First `max` characters of `text`, with an ellipsis when cut
pub fn preview(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{cut}...")
}

/// Final state, one entry per output key in pipeline order
pub fn state_report(session: &RunSession, keys: &[&str]) -> Vec<String> {
    let state = session.state();
    let mut lines = vec![String::new(), RULE.to_string(), "Final state".to_string(), RULE.to_string()];
    for key in keys {
        lines.push(String::new());
        lines.push(format!("{key}:"));
        match state.get(*key) {
            Some(value) => {
                let text = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                lines.push(format!("  {}", preview(&text, PREVIEW_CHARS)));
            }
            None => lines.push("  (not generated)".to_string()),
        }
    }
    lines
}

pub fn plan_report(plan: &PipelinePlan) -> Vec<String> {
    let mut lines = vec![format!("Pipeline: {}", plan.name)];
    for (i, stage) in plan.stages.iter().enumerate() {
        lines.push(format!("{}. {} ({})", i + 1, stage.name, stage.kind));
        for agent in &stage.agents {
            lines.push(format!("   - {} -> {}", agent.name, agent.output_key));
            if !agent.reads.is_empty() {
                lines.push(format!("       reads: {}", agent.reads.join(", ")));
            }
            if !agent.capabilities.is_empty() {
                lines.push(format!("       tools: {}", agent.capabilities.join(", ")));
            }
        }
    }
    lines
}
