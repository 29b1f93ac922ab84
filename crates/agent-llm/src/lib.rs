//! Model provider layer
//!
//! Provider-agnostic conversation types and the [`LLMProvider`] trait the
//! agent runtime drives, plus an OpenAI-compatible chat-completions provider
//! that also serves the Vertex AI endpoint.

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;
pub mod providers;

pub use completion::{
    CompletionRequest, CompletionResponse, OutputFormat, StopReason, TokenUsage, ToolDefinition,
};
pub use error::{LLMError, Result};
pub use messages::{ContentBlock, Message, Role, ToolUse};
pub use provider::LLMProvider;
