//! Marketaux-backed capability: news with per-entity sentiment

use super::{GET_FINANCIAL_NEWS_WITH_SENTIMENT, bounded_arg, str_arg};
use crate::api::MarketauxClient;
use crate::api::marketaux::normalize_news;
use crate::cache::{CacheKey, ResponseCache};
use agent_tools::{Capability, CapabilityError, CapabilitySpec, ParamSpec, ParameterSchema};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

const MAX_ARTICLES: u32 = 50;

/// News articles with sentiment scores per mentioned entity
pub struct NewsSentimentTool {
    spec: CapabilitySpec,
    client: Arc<MarketauxClient>,
    cache: ResponseCache,
}

impl NewsSentimentTool {
    pub fn new(client: Arc<MarketauxClient>, cache: ResponseCache) -> Self {
        Self {
            spec: CapabilitySpec::new(
                GET_FINANCIAL_NEWS_WITH_SENTIMENT,
                "Get financial news for the given symbols, each article scored for \
                 sentiment per mentioned entity.",
            )
            .parameters(
                ParameterSchema::new()
                    .param(
                        ParamSpec::string("symbols")
                            .describe("Comma separated tickers, e.g. AAPL,GOOGL,MSFT")
                            .required(),
                    )
                    .param(
                        ParamSpec::integer("limit")
                            .describe("Number of articles (max 50)")
                            .default_value(10),
                    ),
            ),
            client,
            cache,
        }
    }
}

/// Upper-cased, trimmed, comma separated list without blanks
fn normalize_symbols(raw: &str) -> String {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

#[async_trait]
impl Capability for NewsSentimentTool {
    fn spec(&self) -> &CapabilitySpec {
        &self.spec
    }

    async fn execute(&self, args: Value) -> Result<Value, CapabilityError> {
        let symbols = normalize_symbols(str_arg(&args, "symbols")?);
        if symbols.is_empty() {
            return Err(CapabilityError::Validation(
                "parameter 'symbols' must name at least one ticker".into(),
            ));
        }
        let limit = bounded_arg(&args, "limit", 1, MAX_ARTICLES)?;

        self.cache
            .get_or_fetch(
                CacheKey::new(GET_FINANCIAL_NEWS_WITH_SENTIMENT, &json!([symbols, limit])),
                || async {
                    let raw = self.client.news(&symbols, limit).await?;
                    normalize_news(&symbols, &raw)
                },
            )
            .await
            .map_err(CapabilityError::from)
    }
}
