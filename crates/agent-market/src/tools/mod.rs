//! Market data capabilities for LLM agents
//!
//! [`market_capabilities`] builds the registry the pipeline runs with:
//! every provider whose credentials are configured contributes its
//! capabilities, the others are declared unavailable so agents that list
//! them are built without them.

pub mod finnhub;
pub mod fred;
pub mod marketaux;
pub mod reddit;

pub use finnhub::{
    BasicFinancialsTool, CompanyNewsTool, CompanyProfileTool, MarketNewsTool, SocialSentimentTool,
    StockQuoteTool,
};
pub use fred::{EconomicIndicatorsTool, EconomicSeriesTool};
pub use marketaux::NewsSentimentTool;
pub use reddit::{RedditHotPostsTool, RedditSearchTool};

use crate::api::{FinnhubClient, FredClient, MarketauxClient, RedditClient};
use crate::cache::CacheManager;
use crate::config::MarketConfig;
use agent_core::Result;
use agent_tools::{CapabilityError, CapabilityRegistry};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

pub const GET_STOCK_QUOTE: &str = "get_stock_quote";
pub const GET_COMPANY_PROFILE: &str = "get_company_profile";
pub const GET_BASIC_FINANCIALS: &str = "get_basic_financials";
pub const GET_MARKET_NEWS: &str = "get_market_news";
pub const GET_COMPANY_NEWS: &str = "get_company_news";
pub const GET_SOCIAL_SENTIMENT: &str = "get_social_sentiment";
pub const GET_FINANCIAL_NEWS_WITH_SENTIMENT: &str = "get_financial_news_with_sentiment";
pub const GET_ECONOMIC_INDICATORS: &str = "get_economic_indicators";
pub const GET_ECONOMIC_SERIES: &str = "get_economic_series";
pub const GET_REDDIT_HOT_POSTS: &str = "get_reddit_hot_posts";
pub const SEARCH_REDDIT_POSTS: &str = "search_reddit_posts";

const FINNHUB: &[&str] = &[
    GET_STOCK_QUOTE,
    GET_COMPANY_PROFILE,
    GET_BASIC_FINANCIALS,
    GET_MARKET_NEWS,
    GET_COMPANY_NEWS,
    GET_SOCIAL_SENTIMENT,
];
const MARKETAUX: &[&str] = &[GET_FINANCIAL_NEWS_WITH_SENTIMENT];
const FRED: &[&str] = &[GET_ECONOMIC_INDICATORS, GET_ECONOMIC_SERIES];
const REDDIT: &[&str] = &[GET_REDDIT_HOT_POSTS, SEARCH_REDDIT_POSTS];

/// Every capability name the market agents can bind
pub fn all_capability_names() -> Vec<&'static str> {
    [FINNHUB, MARKETAUX, FRED, REDDIT].concat()
}

fn declare_unavailable(registry: &mut CapabilityRegistry, names: &[&str], reason: &str) {
    warn!(capabilities = ?names, reason = %reason, "Provider not configured");
    for name in names {
        registry.declare_unavailable(*name, reason);
    }
}

/// Registry of the market capabilities available under `config`
pub fn market_capabilities(config: &MarketConfig) -> Result<CapabilityRegistry> {
    let caches = CacheManager::from_config(config);
    let mut registry = CapabilityRegistry::new().with_default_timeout(config.call_timeout);

    if config.finnhub_api_key.is_some() {
        let client = Arc::new(FinnhubClient::new(config)?);
        registry.register(Arc::new(StockQuoteTool::new(client.clone(), caches.realtime.clone())))?;
        registry.register(Arc::new(CompanyProfileTool::new(client.clone(), caches.reference.clone())))?;
        registry.register(Arc::new(BasicFinancialsTool::new(client.clone(), caches.reference.clone())))?;
        registry.register(Arc::new(MarketNewsTool::new(client.clone(), caches.news.clone())))?;
        registry.register(Arc::new(CompanyNewsTool::new(client.clone(), caches.news.clone())))?;
        registry.register(Arc::new(SocialSentimentTool::new(client, caches.realtime.clone())))?;
    } else {
        declare_unavailable(&mut registry, FINNHUB, "FINNHUB_API_KEY not set");
    }

    if config.marketaux_api_key.is_some() {
        let client = Arc::new(MarketauxClient::new(config)?);
        registry.register(Arc::new(NewsSentimentTool::new(client, caches.news.clone())))?;
    } else {
        declare_unavailable(&mut registry, MARKETAUX, "MARKETAUX_API_KEY not set");
    }

    if config.fred_api_key.is_some() {
        let client = Arc::new(FredClient::new(config)?);
        registry.register(Arc::new(EconomicIndicatorsTool::new(client.clone(), caches.reference.clone())))?;
        registry.register(Arc::new(EconomicSeriesTool::new(client, caches.reference.clone())))?;
    } else {
        declare_unavailable(&mut registry, FRED, "FRED_API_KEY not set");
    }

    if config.reddit_credentials().is_some() {
        let client = Arc::new(RedditClient::new(config)?);
        registry.register(Arc::new(RedditHotPostsTool::new(client.clone(), caches.news.clone())))?;
        registry.register(Arc::new(RedditSearchTool::new(client, caches.news)))?;
    } else {
        declare_unavailable(
            &mut registry,
            REDDIT,
            "REDDIT_CLIENT_ID and REDDIT_CLIENT_SECRET not set",
        );
    }

    info!(
        available = registry.len(),
        unavailable = registry.unavailable().len(),
        "Market capabilities ready"
    );
    Ok(registry)
}

/// String argument; validation guarantees presence for required parameters
pub(crate) fn str_arg<'a>(args: &'a Value, name: &str) -> std::result::Result<&'a str, CapabilityError> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| CapabilityError::Validation(format!("missing parameter '{name}'")))
}

/// Integer argument clamped into `min..=max`
pub(crate) fn bounded_arg(args: &Value, name: &str, min: u32, max: u32) -> std::result::Result<u32, CapabilityError> {
    let value = args
        .get(name)
        .ok_or_else(|| CapabilityError::Validation(format!("missing parameter '{name}'")))?;
    let clamped = if let Some(n) = value.as_i64() {
        n.clamp(i64::from(min), i64::from(max))
    } else if value.is_u64() {
        // Above i64::MAX
        i64::from(max)
    } else if let Some(f) = value.as_f64().filter(|f| f.fract() == 0.0) {
        (f as i64).clamp(i64::from(min), i64::from(max))
    } else {
        return Err(CapabilityError::Validation(format!(
            "parameter '{name}' must be an integer, got {value}"
        )));
    };
    Ok(clamped as u32)
}

/// Ticker symbol, trimmed and upper-cased
pub(crate) fn symbol_arg(args: &Value, name: &str) -> std::result::Result<String, CapabilityError> {
    let symbol = str_arg(args, name)?.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(CapabilityError::Validation(format!("parameter '{name}' must not be empty")));
    }
    Ok(symbol)
}
