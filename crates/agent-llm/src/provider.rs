use crate::{CompletionRequest, CompletionResponse, Result};
use async_trait::async_trait;

/// A hosted model reachable over some API
///
/// One call per [`complete`](Self::complete); the caller owns the
/// conversation and the tool loop.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Short provider label used in logs, e.g. "vertex"
    fn name(&self) -> &str;
}
