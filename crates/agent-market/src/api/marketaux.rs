//! Marketaux API client
//!
//! Financial news where every article carries per-entity sentiment scores.
//! Free tier: 100 requests per day

use super::{SharedRateLimiter, http_client, rate_limiter, read_json, round4, truncate};
use crate::config::MarketConfig;
use crate::error::{MarketError, Result};
use agent_utils::Secret;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::instrument;

const PROVIDER: &str = "Marketaux";
const DESCRIPTION_LIMIT: usize = 300;
const MAX_ENTITIES: usize = 5;

/// Marketaux client
pub struct MarketauxClient {
    client: Client,
    base_url: String,
    api_key: Secret,
    rate_limiter: SharedRateLimiter,
}

impl std::fmt::Debug for MarketauxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketauxClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl MarketauxClient {
    pub fn new(config: &MarketConfig) -> Result<Self> {
        let api_key = config
            .marketaux_api_key
            .clone()
            .ok_or(MarketError::MissingCredential("MARKETAUX_API_KEY"))?;

        Ok(Self {
            client: http_client(config.call_timeout),
            base_url: config.endpoints.marketaux.trim_end_matches('/').to_string(),
            api_key,
            rate_limiter: rate_limiter(config.rate_limits.marketaux),
        })
    }

    /// English news mentioning any of `symbols` (comma separated)
    #[instrument(skip(self), fields(provider = PROVIDER))]
    pub async fn news(&self, symbols: &str, limit: u32) -> Result<Value> {
        self.rate_limiter.until_ready().await;

        let limit = limit.to_string();
        let response = self
            .client
            .get(format!("{}/news/all", self.base_url))
            .query(&[
                ("symbols", symbols),
                ("filter_entities", "true"),
                ("language", "en"),
                ("limit", &limit),
                ("api_token", self.api_key.expose()),
            ])
            .send()
            .await
            .map_err(|e| MarketError::transport(PROVIDER, &e))?;

        read_json(PROVIDER, response).await
    }
}

fn field(data: &Value, key: &str) -> Value {
    data.get(key).cloned().unwrap_or(Value::Null)
}

fn normalize_article(article: &Value) -> Value {
    let entities = article
        .get("entities")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let scores: Vec<f64> = entities
        .iter()
        .filter_map(|e| e.get("sentiment_score").and_then(Value::as_f64))
        .collect();
    let sentiment_score = if scores.is_empty() {
        None
    } else {
        Some(round4(scores.iter().sum::<f64>() / scores.len() as f64))
    };

    let description = article
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default();

    json!({
        "title": field(article, "title"),
        "description": truncate(description, DESCRIPTION_LIMIT),
        "source": field(article, "source"),
        "published_at": field(article, "published_at"),
        "url": field(article, "url"),
        "sentiment_score": sentiment_score,
        "entities": entities
            .iter()
            .take(MAX_ENTITIES)
            .map(|e| json!({
                "symbol": field(e, "symbol"),
                "name": field(e, "name"),
                "sentiment_score": field(e, "sentiment_score"),
            }))
            .collect::<Vec<_>>(),
    })
}

pub fn normalize_news(symbols: &str, data: &Value) -> Result<Value> {
    let items = match data.get("data") {
        Some(Value::Array(items)) => items.as_slice(),
        Some(_) => return Err(MarketError::parse(PROVIDER, "data is not a list")),
        None => &[],
    };
    let articles: Vec<Value> = items.iter().map(normalize_article).collect();

    Ok(json!({
        "symbols": symbols,
        "count": articles.len(),
        "articles": articles,
    }))
}
