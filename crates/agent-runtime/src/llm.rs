//! LLM-backed executor running the tool-call loop
//!
//! The loop:
//! 1. Call the model with the conversation and the agent's capabilities
//! 2. If tool use is requested, dispatch every call in order and loop back
//! 3. If the model ends its turn, parse the answer as a JSON document
//! 4. If the answer is not a JSON object, ask for a corrected answer
//!    (bounded by `repair_attempts`)

use crate::executor::{AgentExecutor, Invocation};
use crate::output::extract_document;
use agent_core::{AgentOutput, CapabilityInvocation, Error, Result};
use agent_llm::{
    CompletionRequest, LLMProvider, Message, OutputFormat, StopReason, TokenUsage, ToolDefinition,
};
use agent_tools::CapabilityRegistry;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

const OUTPUT_CONTRACT: &str = "When you have finished, reply with a single JSON object and nothing else. \
Do not wrap it in prose. If some data could not be retrieved, say so inside the JSON object.";

/// Configuration for the model loop
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum number of model calls per invocation
    pub max_iterations: usize,

    /// Model used when the agent spec does not name one
    pub model: String,

    /// Max tokens per completion
    pub max_tokens: usize,

    pub temperature: Option<f32>,

    /// How many times a non-JSON final answer is sent back for correction
    pub repair_attempts: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            model: "gemini-2.0-flash".to_string(),
            max_tokens: 4096,
            temperature: Some(0.2),
            repair_attempts: 1,
        }
    }
}

/// Executor driving a hosted model through an [`LLMProvider`]
pub struct LlmExecutor {
    provider: Arc<dyn LLMProvider>,
    config: ExecutorConfig,
}

impl LlmExecutor {
    pub fn new(provider: Arc<dyn LLMProvider>, config: ExecutorConfig) -> Self {
        Self { provider, config }
    }

    pub fn builder() -> LlmExecutorBuilder {
        LlmExecutorBuilder::new()
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    fn tool_definitions(capabilities: &CapabilityRegistry) -> Vec<ToolDefinition> {
        capabilities
            .list()
            .iter()
            .map(|cap| {
                let spec = cap.spec();
                ToolDefinition::new(spec.name(), spec.description(), spec.input_schema())
            })
            .collect()
    }
}

#[async_trait]
impl AgentExecutor for LlmExecutor {
    async fn execute(&self, inv: Invocation<'_>) -> Result<AgentOutput> {
        let model = inv.model.unwrap_or(&self.config.model);
        let tools = Self::tool_definitions(inv.capabilities);
        let system = format!("{}\n\n{OUTPUT_CONTRACT}", inv.instruction.trim_end());

        let mut conversation = vec![Message::user(inv.query)];
        let mut trace = Vec::new();
        let mut repairs_left = self.config.repair_attempts;
        let mut usage = TokenUsage::default();

        for iteration in 1..=self.config.max_iterations {
            info!(
                agent = %inv.agent,
                iteration,
                max_iterations = self.config.max_iterations,
                model = %model,
                tool_count = tools.len(),
                "Sending request to LLM"
            );

            let request = CompletionRequest::new(model, conversation.clone())
                .with_system(system.clone())
                .with_tools(tools.clone())
                .with_max_tokens(self.config.max_tokens)
                .with_temperature(self.config.temperature)
                .with_output_format(OutputFormat::JsonObject);

            let response = self
                .provider
                .complete(request)
                .await
                .map_err(|e| Error::agent_failure(inv.agent, format!("model call failed: {e}")))?;

            info!(
                agent = %inv.agent,
                stop_reason = ?response.stop_reason,
                input_tokens = response.usage.input_tokens,
                output_tokens = response.usage.output_tokens,
                "LLM response received"
            );
            usage += response.usage;

            let text = response.message.text();
            if let Some(text) = &text {
                inv.events.on_text(inv.agent, text).await;
            }
            conversation.push(response.message.clone());

            match response.stop_reason {
                StopReason::ToolUse => {
                    let calls = response.message.tool_uses();
                    info!(agent = %inv.agent, tool_count = calls.len(), "Agent requested tool use");

                    for call in calls {
                        let dispatched = inv.capabilities.dispatch(&call.name, &call.input).await;
                        let record = CapabilityInvocation {
                            capability: call.name.clone(),
                            arguments: call.input.clone(),
                            result: dispatched.result,
                            is_error: dispatched.is_error,
                            duration_ms: dispatched.duration.as_millis() as u64,
                        };
                        inv.events.on_tool_call(inv.agent, &record).await;

                        conversation.push(Message::tool_result(
                            call.id.clone(),
                            record.result.to_string(),
                            record.is_error,
                        ));
                        trace.push(record);
                    }
                }

                StopReason::ContentFilter => {
                    warn!(agent = %inv.agent, "Answer withheld by the provider's content filter");
                    return Err(Error::agent_failure(inv.agent, "model refused to answer"));
                }

                StopReason::EndTurn | StopReason::MaxTokens => {
                    let truncated = response.stop_reason == StopReason::MaxTokens;
                    match extract_document(text.as_deref().unwrap_or_default()) {
                        Ok(document) => {
                            info!(
                                agent = %inv.agent,
                                iteration,
                                tool_calls = trace.len(),
                                total_tokens = usage.total(),
                                "Agent produced its document"
                            );
                            return Ok(AgentOutput::new(document).with_trace(trace));
                        }
                        Err(reason) if truncated => {
                            return Err(Error::agent_failure(
                                inv.agent,
                                format!("answer truncated at the token limit: {reason}"),
                            ));
                        }
                        Err(reason) if repairs_left > 0 => {
                            repairs_left -= 1;
                            debug!(agent = %inv.agent, reason = %reason, "Requesting a corrected answer");
                            conversation.push(Message::user(format!(
                                "Your previous answer could not be used: {reason}. \
                                 Reply again with only the JSON object."
                            )));
                        }
                        Err(reason) => {
                            return Err(Error::agent_failure(
                                inv.agent,
                                format!("no well-formed document: {reason}"),
                            ));
                        }
                    }
                }
            }
        }

        warn!(
            agent = %inv.agent,
            max_iterations = self.config.max_iterations,
            "Max iterations reached without a document"
        );
        Err(Error::agent_failure(
            inv.agent,
            format!(
                "no document after {} model calls",
                self.config.max_iterations
            ),
        ))
    }
}

/// Builder for [`LlmExecutor`]
#[derive(Default)]
pub struct LlmExecutorBuilder {
    provider: Option<Arc<dyn LLMProvider>>,
    config: ExecutorConfig,
}

impl LlmExecutorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = Some(temperature);
        self
    }

    pub fn repair_attempts(mut self, attempts: usize) -> Self {
        self.config.repair_attempts = attempts;
        self
    }

    pub fn build(self) -> Result<LlmExecutor> {
        let provider = self
            .provider
            .ok_or_else(|| Error::InitializationFailed("Provider not set".to_string()))?;
        Ok(LlmExecutor::new(provider, self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::{AgentEventHandler, NoOpEventHandler};
    use agent_llm::{CompletionResponse, ContentBlock, TokenUsage, ToolUse};
    use agent_tools::{CapabilitySpec, FnCapability, ParamSpec, ParameterSchema};
    use mockall::{Sequence, mock};
    use serde_json::json;
    use std::sync::Mutex;

    mock! {
        pub Provider {}

        #[async_trait]
        impl LLMProvider for Provider {
            async fn complete(&self, request: CompletionRequest) -> agent_llm::Result<CompletionResponse>;
            fn name(&self) -> &str;
        }
    }

    fn text_response(text: &str) -> CompletionResponse {
        CompletionResponse {
            message: Message::assistant(text),
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        }
    }

    fn tool_response(name: &str, input: serde_json::Value) -> CompletionResponse {
        CompletionResponse {
            message: Message::assistant_blocks(vec![ContentBlock::ToolUse(ToolUse {
                id: "call_1".into(),
                name: name.into(),
                input,
            })]),
            stop_reason: StopReason::ToolUse,
            usage: TokenUsage::default(),
        }
    }

    fn quote_registry() -> CapabilityRegistry {
        CapabilityRegistry::new()
            .with(Arc::new(FnCapability::new(
                CapabilitySpec::new("get_stock_quote", "Quote").parameters(
                    ParameterSchema::new().param(ParamSpec::string("symbol").required()),
                ),
                |args| async move { Ok(json!({"symbol": args["symbol"], "current_price": 150.0})) },
            )))
            .unwrap()
    }

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<CapabilityInvocation>>,
        texts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AgentEventHandler for Recorder {
        async fn on_tool_call(&self, _agent: &str, call: &CapabilityInvocation) {
            self.calls.lock().unwrap().push(call.clone());
        }

        async fn on_text(&self, _agent: &str, text: &str) {
            self.texts.lock().unwrap().push(text.to_string());
        }
    }

    fn invocation<'a>(
        registry: &'a CapabilityRegistry,
        events: &'a dyn AgentEventHandler,
    ) -> Invocation<'a> {
        Invocation {
            agent: "financial_analysis_agent",
            model: None,
            instruction: "Analyze the stock.",
            query: "How is AAPL doing?",
            capabilities: registry,
            events,
        }
    }

    #[tokio::test]
    async fn test_tool_loop_then_document() {
        let mut provider = MockProvider::new();
        let mut seq = Sequence::new();
        provider
            .expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|req| req.tools.len() == 1 && !req.wants_json() && req.system.is_some())
            .returning(|_| Ok(tool_response("get_stock_quote", json!({"symbol": "AAPL"}))));
        provider
            .expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|req| req.messages.len() == 3)
            .returning(|_| Ok(text_response("```json\n{\"rating\": \"BUY\"}\n```")));

        let executor = LlmExecutor::new(Arc::new(provider), ExecutorConfig::default());
        let registry = quote_registry();
        let recorder = Recorder::default();

        let output = executor
            .execute(invocation(&registry, &recorder))
            .await
            .unwrap();

        assert_eq!(output.document, json!({"rating": "BUY"}));
        assert_eq!(output.trace.len(), 1);
        assert_eq!(output.trace[0].result["current_price"], 150.0);
        assert_eq!(recorder.calls.lock().unwrap().len(), 1);
        assert_eq!(recorder.texts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_tool_arguments_are_fed_back() {
        let mut provider = MockProvider::new();
        let mut seq = Sequence::new();
        provider
            .expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(tool_response("get_stock_quote", json!({}))));
        provider
            .expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(text_response("{\"note\": \"no quote\"}")));

        let executor = LlmExecutor::new(Arc::new(provider), ExecutorConfig::default());
        let registry = quote_registry();

        let output = executor
            .execute(invocation(&registry, &NoOpEventHandler))
            .await
            .unwrap();

        assert!(output.trace[0].is_error);
        assert_eq!(output.trace[0].result["error_kind"], "validation");
    }

    #[tokio::test]
    async fn test_non_json_answer_is_repaired_once() {
        let mut provider = MockProvider::new();
        let mut seq = Sequence::new();
        provider
            .expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(text_response("The market looks fine.")));
        provider
            .expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(text_response("{\"market_mood\": \"NEUTRAL\"}")));

        let executor = LlmExecutor::new(Arc::new(provider), ExecutorConfig::default());
        let registry = CapabilityRegistry::new();

        let output = executor
            .execute(invocation(&registry, &NoOpEventHandler))
            .await
            .unwrap();
        assert_eq!(output.document["market_mood"], "NEUTRAL");
    }

    #[tokio::test]
    async fn test_non_json_answer_after_repairs_is_agent_failure() {
        let mut provider = MockProvider::new();
        provider
            .expect_complete()
            .times(2)
            .returning(|_| Ok(text_response("no json here")));

        let executor = LlmExecutor::new(Arc::new(provider), ExecutorConfig::default());
        let registry = CapabilityRegistry::new();

        let err = executor
            .execute(invocation(&registry, &NoOpEventHandler))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AgentFailure { .. }));
    }

    #[tokio::test]
    async fn test_iterations_exhausted() {
        let mut provider = MockProvider::new();
        provider
            .expect_complete()
            .times(3)
            .returning(|_| Ok(tool_response("get_stock_quote", json!({"symbol": "AAPL"}))));

        let executor = LlmExecutor::builder()
            .provider(Arc::new(provider))
            .max_iterations(3)
            .build()
            .unwrap();
        let registry = quote_registry();

        let err = executor
            .execute(invocation(&registry, &NoOpEventHandler))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no document after 3 model calls"));
    }

    #[tokio::test]
    async fn test_provider_error_is_agent_failure() {
        let mut provider = MockProvider::new();
        provider
            .expect_complete()
            .times(1)
            .returning(|_| Err(agent_llm::LLMError::AuthenticationFailed));

        let executor = LlmExecutor::new(Arc::new(provider), ExecutorConfig::default());
        let registry = CapabilityRegistry::new();

        let err = executor
            .execute(invocation(&registry, &NoOpEventHandler))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AgentFailure { ref agent, .. } if agent == "financial_analysis_agent"));
    }

    #[test]
    fn test_builder_requires_provider() {
        assert!(LlmExecutor::builder().build().is_err());
    }
}
