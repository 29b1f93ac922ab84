//! The market intelligence pipeline
//!
//! Phase 1 gathers news, financial and sentiment data in parallel; phase 2
//! analyzes trends over what phase 1 wrote; phase 3 writes the strategy
//! report from everything before it.

use crate::agents::{financial_agent, news_agent, sentiment_agent, strategy_agent, trend_agent};
use crate::config::MarketConfig;
use crate::tools::market_capabilities;
use agent_core::{Agent, AgentSpec, Result};
use agent_runtime::{AgentExecutor, AgentRuntime};
use agent_workflow::Pipeline;
use std::sync::Arc;
use tracing::info;

pub const PIPELINE_NAME: &str = "market_intelligence_pipeline";
pub const DATA_COLLECTION: &str = "data_collection";

/// Build the pipeline's agents on `runtime`
///
/// Capabilities the runtime's registry declares unavailable are dropped
/// from the agents that list them; unknown ones are an error.
pub fn market_intelligence_pipeline(runtime: &AgentRuntime, model: &str) -> Result<Pipeline> {
    let build = |spec: AgentSpec| -> Result<Arc<dyn Agent>> { Ok(Arc::new(runtime.create_agent(spec)?)) };

    let pipeline = Pipeline::builder(PIPELINE_NAME)
        .parallel(
            DATA_COLLECTION,
            vec![
                build(news_agent(model)?)?,
                build(financial_agent(model)?)?,
                build(sentiment_agent(model)?)?,
            ],
        )
        .sequential(build(trend_agent(model)?)?)
        .sequential(build(strategy_agent(model)?)?)
        .build()?;

    info!(
        pipeline = PIPELINE_NAME,
        stages = pipeline.stages().len(),
        agents = pipeline.agents().count(),
        "Market pipeline built"
    );
    Ok(pipeline)
}

/// Capabilities from `config`, agents driven by `executor`
pub fn build_market_pipeline(config: &MarketConfig, executor: Arc<dyn AgentExecutor>) -> Result<Pipeline> {
    let runtime = AgentRuntime::builder()
        .executor(executor)
        .capabilities(market_capabilities(config)?)
        .build()?;
    market_intelligence_pipeline(&runtime, &config.model)
}
