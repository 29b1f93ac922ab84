//! Market intelligence agents
//!
//! This crate wires market data providers into the multi-agent pipeline:
//!
//! - Provider clients for Finnhub, FRED, Marketaux and Reddit with rate
//!   limiting and short-lived response caching
//! - Eleven capabilities exposing those providers to agents
//! - Five agent specs: news, financial and sentiment gathering, trend
//!   analysis and the final strategy report
//! - The three-stage `market_intelligence_pipeline`
//!
//! # Example
//!
//! ```rust,ignore
//! use agent_market::{MarketConfig, build_market_pipeline};
//! use agent_runtime::{ExecutorConfig, LlmExecutor};
//! use agent_workflow::Runner;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = MarketConfig::from_env()?;
//!     config.validate()?;
//!
//!     let executor = Arc::new(LlmExecutor::new(
//!         /* your provider */,
//!         ExecutorConfig { model: config.model.clone(), ..Default::default() },
//!     ));
//!     let pipeline = build_market_pipeline(&config, executor)?;
//!
//!     let session = Runner::new(pipeline).run("Analyze Apple (AAPL)").await;
//!     println!("{:#?}", session.final_output());
//!     Ok(())
//! }
//! ```

pub mod agents;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod tools;

pub use agents::{STATE_KEYS, market_agent_specs};
pub use config::{CredentialReport, Endpoints, MarketConfig, MarketConfigBuilder, RateLimits};
pub use error::{MarketError, Result};
pub use pipeline::{DATA_COLLECTION, PIPELINE_NAME, build_market_pipeline, market_intelligence_pipeline};
pub use tools::{all_capability_names, market_capabilities};
