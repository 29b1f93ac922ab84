//! OpenAI-compatible chat completions provider
//!
//! Speaks the `/chat/completions` wire format, which both OpenAI and the
//! Vertex AI OpenAI-compatible endpoint accept. Gemini models are reached
//! through [`OpenAIConfig::vertex`].
//!
//! # Example
//!
//! ```no_run
//! use agent_llm::{CompletionRequest, LLMProvider, Message};
//! use agent_llm::providers::{OpenAIConfig, OpenAIProvider};
//!
//! # async fn run() -> agent_llm::Result<()> {
//! let config = OpenAIConfig::vertex("my-project", "us-central1", "ya29.token");
//! let provider = OpenAIProvider::with_config(config)?;
//!
//! let request = CompletionRequest::new(
//!     "gemini-2.0-flash",
//!     vec![Message::user("Summarize today's market")],
//! );
//!
//! let response = provider.complete(request).await?;
//! println!("{:?}", response.message.text());
//! # Ok(())
//! # }
//! ```

use crate::{
    CompletionRequest, CompletionResponse, ContentBlock, LLMError, LLMProvider, Message, Result,
    Role, StopReason, TokenUsage, ToolDefinition, ToolUse,
};
use agent_utils::Secret;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for an OpenAI-compatible endpoint
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Bearer credential
    pub api_key: Secret,

    /// Base URL; `/chat/completions` is appended
    pub api_base: String,

    /// Request timeout in seconds (default: 120)
    pub timeout_secs: u64,

    /// Prepended to model names that do not already carry it
    ///
    /// Vertex AI expects publisher-qualified ids such as `google/gemini-2.0-flash`.
    pub model_prefix: Option<String>,

    /// Provider name reported by [`LLMProvider::name`]
    pub provider_name: String,
}

impl OpenAIConfig {
    /// Config for the public OpenAI endpoint
    pub fn new(api_key: impl Into<Secret>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            model_prefix: None,
            provider_name: "openai".to_string(),
        }
    }

    /// Config for the Vertex AI OpenAI-compatible endpoint of a project
    ///
    /// `access_token` is an OAuth access token for the project (for example
    /// the output of `gcloud auth print-access-token`).
    pub fn vertex(project: &str, region: &str, access_token: impl Into<Secret>) -> Self {
        Self {
            api_key: access_token.into(),
            api_base: format!(
                "https://{region}-aiplatform.googleapis.com/v1/projects/{project}/locations/{region}/endpoints/openapi"
            ),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            model_prefix: Some("google/".to_string()),
            provider_name: "vertex".to_string(),
        }
    }

    /// Set custom API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_model_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.model_prefix = Some(prefix.into());
        self
    }

    /// Model id as sent on the wire
    pub fn qualified_model(&self, model: &str) -> String {
        match &self.model_prefix {
            Some(prefix) if !model.starts_with(prefix.as_str()) => format!("{prefix}{model}"),
            _ => model.to_string(),
        }
    }
}

/// OpenAI-compatible provider
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    /// Create a provider with custom configuration
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(LLMError::ConfigurationError("API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Get the current configuration
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    #[instrument(skip(self, request), fields(model = %request.model, provider = %self.config.provider_name))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let model = self.config.qualified_model(&request.model);
        let response_format = request.wants_json().then(|| ResponseFormat {
            format_type: "json_object".to_string(),
        });
        let body = ChatRequest {
            model: model.clone(),
            messages: build_chat_messages(request.system, request.messages),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            tools: (!request.tools.is_empty()).then(|| convert_tools(&request.tools)),
            response_format,
        };

        debug!(messages = body.messages.len(), "Sending chat completion request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .bearer_auth(self.config.api_key.expose())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Chat completion request rejected");
            return Err(match status.as_u16() {
                401 | 403 => LLMError::AuthenticationFailed,
                429 => LLMError::RateLimitExceeded(error_text),
                400 => LLMError::InvalidRequest(error_text),
                404 => LLMError::ModelNotFound(model),
                _ => LLMError::RequestFailed(format!("HTTP {status}: {error_text}")),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LLMError::UnexpectedResponse(format!("Failed to parse response: {e}")))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::UnexpectedResponse("No choices in response".to_string()))?;

        let usage = parsed.usage.unwrap_or_default();
        debug!(
            finish_reason = choice.finish_reason.as_deref().unwrap_or("none"),
            input_tokens = usage.prompt_tokens,
            output_tokens = usage.completion_tokens,
            "Received chat completion"
        );

        let message = parse_response_message(choice.message)?;
        let stop_reason = map_stop_reason(choice.finish_reason.as_deref(), &message);

        Ok(CompletionResponse {
            message,
            stop_reason,
            usage: TokenUsage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            },
        })
    }

    fn name(&self) -> &str {
        &self.config.provider_name
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ChatTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Serialize, PartialEq)]
struct ChatMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ChatToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl ChatMessage {
    fn text(role: &'static str, content: String) -> Self {
        Self {
            role,
            content: Some(content),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatTool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: ChatFunction,
}

#[derive(Debug, Serialize)]
struct ChatFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct ChatToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    tool_type: String,
    function: ChatFunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct ChatFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ChatToolCall>>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
}

// ============================================================================
// Conversion functions
// ============================================================================

/// System prompt first, then each message; tool results become `tool` messages
fn build_chat_messages(system: Option<String>, messages: Vec<Message>) -> Vec<ChatMessage> {
    let mut result = Vec::with_capacity(messages.len() + 1);
    if let Some(sys) = system {
        result.push(ChatMessage::text("system", sys));
    }
    for msg in messages {
        result.extend(convert_message(msg));
    }
    result
}

fn convert_message(msg: Message) -> Vec<ChatMessage> {
    let role = match msg.role {
        Role::User => "user",
        Role::Assistant => "assistant",
    };

    let mut out = Vec::new();
    let mut texts = Vec::new();
    let mut tool_calls = Vec::new();

    for block in msg.content {
        match block {
            ContentBlock::Text { text } => texts.push(text),
            ContentBlock::ToolUse(ToolUse { id, name, input }) => tool_calls.push(ChatToolCall {
                id,
                tool_type: function_type(),
                function: ChatFunctionCall {
                    name,
                    arguments: input.to_string(),
                },
            }),
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                ..
            } => out.push(ChatMessage {
                role: "tool",
                content: Some(content),
                tool_calls: None,
                tool_call_id: Some(tool_use_id),
            }),
        }
    }

    if !texts.is_empty() || !tool_calls.is_empty() {
        out.insert(
            0,
            ChatMessage {
                role,
                content: (!texts.is_empty()).then(|| texts.join("\n")),
                tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
                tool_call_id: None,
            },
        );
    }

    out
}

fn convert_tools(tools: &[ToolDefinition]) -> Vec<ChatTool> {
    tools
        .iter()
        .map(|tool| ChatTool {
            tool_type: "function",
            function: ChatFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.parameters.clone(),
            },
        })
        .collect()
}

fn parse_response_message(msg: ChatResponseMessage) -> Result<Message> {
    let mut blocks = Vec::new();

    if let Some(content) = msg.content.filter(|c| !c.is_empty()) {
        blocks.push(ContentBlock::Text { text: content });
    }

    for call in msg.tool_calls.unwrap_or_default() {
        let input = if call.function.arguments.trim().is_empty() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            serde_json::from_str(&call.function.arguments).map_err(|e| {
                LLMError::UnexpectedResponse(format!(
                    "Failed to parse arguments of tool call '{}': {e}",
                    call.function.name
                ))
            })?
        };

        blocks.push(ContentBlock::ToolUse(ToolUse {
            id: call.id,
            name: call.function.name,
            input,
        }));
    }

    Ok(Message::assistant_blocks(blocks))
}

/// Some compatible endpoints report `stop` even when tool calls are present
fn map_stop_reason(reason: Option<&str>, message: &Message) -> StopReason {
    if message.has_tool_uses() {
        return StopReason::ToolUse;
    }
    match reason {
        Some("length") => StopReason::MaxTokens,
        Some("tool_calls") => StopReason::ToolUse,
        Some("content_filter") => StopReason::ContentFilter,
        _ => StopReason::EndTurn,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OutputFormat;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_vertex_config() {
        let config = OpenAIConfig::vertex("proj-1", "europe-west4", "tok");
        assert_eq!(
            config.api_base,
            "https://europe-west4-aiplatform.googleapis.com/v1/projects/proj-1/locations/europe-west4/endpoints/openapi"
        );
        assert_eq!(config.qualified_model("gemini-2.0-flash"), "google/gemini-2.0-flash");
        assert_eq!(config.qualified_model("google/gemini-2.0-flash"), "google/gemini-2.0-flash");
        assert_eq!(config.provider_name, "vertex");
    }

    #[test]
    fn test_empty_key_is_rejected() {
        let result = OpenAIProvider::with_config(OpenAIConfig::new(""));
        assert!(matches!(result, Err(LLMError::ConfigurationError(_))));
    }

    #[test]
    fn test_system_prompt_goes_first() {
        let messages = build_chat_messages(Some("You are helpful".into()), vec![Message::user("Hi")]);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1], ChatMessage::text("user", "Hi".into()));
    }

    #[test]
    fn test_tool_round_trip_conversion() {
        let assistant = Message::assistant_blocks(vec![ContentBlock::ToolUse(ToolUse {
            id: "call_1".into(),
            name: "get_stock_quote".into(),
            input: json!({"symbol": "AAPL"}),
        })]);
        let converted = convert_message(assistant);
        assert_eq!(converted.len(), 1);
        assert!(converted[0].content.is_none());
        let calls = converted[0].tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.arguments, r#"{"symbol":"AAPL"}"#);

        let result = convert_message(Message::tool_result("call_1", "{\"c\":1}", false));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].role, "tool");
        assert_eq!(result[0].tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn test_stop_reason_mapping() {
        let text = Message::assistant("done");
        assert_eq!(map_stop_reason(Some("stop"), &text), StopReason::EndTurn);
        assert_eq!(map_stop_reason(Some("length"), &text), StopReason::MaxTokens);
        assert_eq!(map_stop_reason(Some("content_filter"), &text), StopReason::ContentFilter);
        assert_eq!(map_stop_reason(None, &text), StopReason::EndTurn);

        let call = Message::assistant_blocks(vec![ContentBlock::ToolUse(ToolUse {
            id: "c".into(),
            name: "n".into(),
            input: json!({}),
        })]);
        assert_eq!(map_stop_reason(Some("stop"), &call), StopReason::ToolUse);
    }

    #[test]
    fn test_malformed_tool_arguments() {
        let msg = ChatResponseMessage {
            content: None,
            tool_calls: Some(vec![ChatToolCall {
                id: "c".into(),
                tool_type: function_type(),
                function: ChatFunctionCall {
                    name: "get_stock_quote".into(),
                    arguments: "{not json".into(),
                },
            }]),
        };
        assert!(matches!(
            parse_response_message(msg),
            Err(LLMError::UnexpectedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_complete_against_mock_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "google/gemini-2.0-flash",
                "response_format": {"type": "json_object"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "message": {"role": "assistant", "content": "{\"ok\":true}"},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 12, "completion_tokens": 4}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = OpenAIConfig::new("test-key")
            .with_api_base(server.uri())
            .with_model_prefix("google/");
        let provider = OpenAIProvider::with_config(config).unwrap();

        let request = CompletionRequest::new("gemini-2.0-flash", vec![Message::user("hi")])
            .with_output_format(OutputFormat::JsonObject);
        let response = provider.complete(request).await.unwrap();

        assert_eq!(response.message.text().as_deref(), Some("{\"ok\":true}"));
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert_eq!(response.usage.total(), 16);
    }

    #[tokio::test]
    async fn test_rate_limit_status_is_mapped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exhausted"))
            .mount(&server)
            .await;

        let provider =
            OpenAIProvider::with_config(OpenAIConfig::new("k").with_api_base(server.uri())).unwrap();
        let err = provider
            .complete(CompletionRequest::new("m", vec![Message::user("x")]))
            .await
            .unwrap_err();

        assert!(matches!(err, LLMError::RateLimitExceeded(ref body) if body == "quota exhausted"));
        assert!(err.is_transient());
    }
}
