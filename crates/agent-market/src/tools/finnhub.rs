//! Finnhub-backed capabilities: quotes, company data, news, social sentiment

use super::{
    GET_BASIC_FINANCIALS, GET_COMPANY_NEWS, GET_COMPANY_PROFILE, GET_MARKET_NEWS,
    GET_SOCIAL_SENTIMENT, GET_STOCK_QUOTE, bounded_arg, str_arg, symbol_arg,
};
use crate::api::FinnhubClient;
use crate::api::finnhub::{
    news_window, normalize_company_news, normalize_financials, normalize_market_news,
    normalize_profile, normalize_quote, normalize_social_sentiment,
};
use crate::cache::{CacheKey, ResponseCache};
use crate::error::MarketError;
use agent_tools::{Capability, CapabilityError, CapabilitySpec, ParamSpec, ParameterSchema};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

const MAX_ARTICLES: u32 = 50;

fn symbol_schema() -> ParameterSchema {
    ParameterSchema::new().param(
        ParamSpec::string("symbol")
            .describe("Ticker symbol, e.g. AAPL, GOOGL, MSFT")
            .required(),
    )
}

/// Real-time quote
pub struct StockQuoteTool {
    spec: CapabilitySpec,
    client: Arc<FinnhubClient>,
    cache: ResponseCache,
}

impl StockQuoteTool {
    pub fn new(client: Arc<FinnhubClient>, cache: ResponseCache) -> Self {
        Self {
            spec: CapabilitySpec::new(
                GET_STOCK_QUOTE,
                "Get the real-time stock price: current price, change, percent change, \
                 day high and low, open and previous close.",
            )
            .parameters(symbol_schema()),
            client,
            cache,
        }
    }
}

#[async_trait]
impl Capability for StockQuoteTool {
    fn spec(&self) -> &CapabilitySpec {
        &self.spec
    }

    async fn execute(&self, args: Value) -> Result<Value, CapabilityError> {
        let symbol = symbol_arg(&args, "symbol")?;
        self.cache
            .get_or_fetch(CacheKey::new(GET_STOCK_QUOTE, &symbol), || async {
                let raw = self.client.quote(&symbol).await?;
                normalize_quote(&symbol, &raw)
            })
            .await
            .map_err(CapabilityError::from)
    }
}

/// Company profile
pub struct CompanyProfileTool {
    spec: CapabilitySpec,
    client: Arc<FinnhubClient>,
    cache: ResponseCache,
}

impl CompanyProfileTool {
    pub fn new(client: Arc<FinnhubClient>, cache: ResponseCache) -> Self {
        Self {
            spec: CapabilitySpec::new(
                GET_COMPANY_PROFILE,
                "Get the company profile: name, industry, market capitalization, IPO date, \
                 country, exchange and website.",
            )
            .parameters(symbol_schema()),
            client,
            cache,
        }
    }
}

#[async_trait]
impl Capability for CompanyProfileTool {
    fn spec(&self) -> &CapabilitySpec {
        &self.spec
    }

    async fn execute(&self, args: Value) -> Result<Value, CapabilityError> {
        let symbol = symbol_arg(&args, "symbol")?;
        self.cache
            .get_or_fetch(CacheKey::new(GET_COMPANY_PROFILE, &symbol), || async {
                let raw = self.client.profile(&symbol).await?;
                normalize_profile(&symbol, &raw)
            })
            .await
            .map_err(CapabilityError::from)
    }
}

/// Key financial ratios
pub struct BasicFinancialsTool {
    spec: CapabilitySpec,
    client: Arc<FinnhubClient>,
    cache: ResponseCache,
}

impl BasicFinancialsTool {
    pub fn new(client: Arc<FinnhubClient>, cache: ResponseCache) -> Self {
        Self {
            spec: CapabilitySpec::new(
                GET_BASIC_FINANCIALS,
                "Get key financial metrics: P/E, P/B, dividend yield, ROE, ROA, EPS (TTM), \
                 revenue growth, 52-week high and low, beta.",
            )
            .parameters(symbol_schema()),
            client,
            cache,
        }
    }
}

#[async_trait]
impl Capability for BasicFinancialsTool {
    fn spec(&self) -> &CapabilitySpec {
        &self.spec
    }

    async fn execute(&self, args: Value) -> Result<Value, CapabilityError> {
        let symbol = symbol_arg(&args, "symbol")?;
        self.cache
            .get_or_fetch(CacheKey::new(GET_BASIC_FINANCIALS, &symbol), || async {
                let raw = self.client.metrics(&symbol).await?;
                normalize_financials(&symbol, &raw)
            })
            .await
            .map_err(CapabilityError::from)
    }
}

/// Latest market-wide news
pub struct MarketNewsTool {
    spec: CapabilitySpec,
    client: Arc<FinnhubClient>,
    cache: ResponseCache,
}

impl MarketNewsTool {
    pub fn new(client: Arc<FinnhubClient>, cache: ResponseCache) -> Self {
        Self {
            spec: CapabilitySpec::new(GET_MARKET_NEWS, "Get the latest market news.").parameters(
                ParameterSchema::new()
                    .param(
                        ParamSpec::string("category")
                            .describe("News category")
                            .one_of(["general", "forex", "crypto", "merger"])
                            .default_value("general"),
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

#[async_trait]
impl Capability for MarketNewsTool {
    fn spec(&self) -> &CapabilitySpec {
        &self.spec
    }

    async fn execute(&self, args: Value) -> Result<Value, CapabilityError> {
        let category = str_arg(&args, "category")?;
        let limit = bounded_arg(&args, "limit", 1, MAX_ARTICLES)?;
        self.cache
            .get_or_fetch(CacheKey::new(GET_MARKET_NEWS, &json!([category, limit])), || async {
                let raw = self.client.market_news(category).await?;
                Ok::<_, MarketError>(normalize_market_news(category, limit as usize, &raw))
            })
            .await
            .map_err(CapabilityError::from)
    }
}

/// News about one company over a recent window
pub struct CompanyNewsTool {
    spec: CapabilitySpec,
    client: Arc<FinnhubClient>,
    cache: ResponseCache,
}

impl CompanyNewsTool {
    pub fn new(client: Arc<FinnhubClient>, cache: ResponseCache) -> Self {
        Self {
            spec: CapabilitySpec::new(GET_COMPANY_NEWS, "Get news about a specific company.")
                .parameters(
                    symbol_schema()
                        .param(
                            ParamSpec::integer("days")
                                .describe("How many past days to cover")
                                .default_value(7),
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

#[async_trait]
impl Capability for CompanyNewsTool {
    fn spec(&self) -> &CapabilitySpec {
        &self.spec
    }

    async fn execute(&self, args: Value) -> Result<Value, CapabilityError> {
        let symbol = symbol_arg(&args, "symbol")?;
        let days = bounded_arg(&args, "days", 1, 365)?;
        let limit = bounded_arg(&args, "limit", 1, MAX_ARTICLES)?;
        let window = news_window(days);

        self.cache
            .get_or_fetch(CacheKey::new(GET_COMPANY_NEWS, &json!([symbol, days, limit])), || async {
                let raw = self.client.company_news(&symbol, window.0, window.1).await?;
                Ok::<_, MarketError>(normalize_company_news(&symbol, window, limit as usize, &raw))
            })
            .await
            .map_err(CapabilityError::from)
    }
}

/// Reddit and Twitter mention statistics
pub struct SocialSentimentTool {
    spec: CapabilitySpec,
    client: Arc<FinnhubClient>,
    cache: ResponseCache,
}

impl SocialSentimentTool {
    pub fn new(client: Arc<FinnhubClient>, cache: ResponseCache) -> Self {
        Self {
            spec: CapabilitySpec::new(
                GET_SOCIAL_SENTIMENT,
                "Get social media sentiment: Reddit and Twitter mention counts with average \
                 positive and negative scores.",
            )
            .parameters(symbol_schema()),
            client,
            cache,
        }
    }
}

#[async_trait]
impl Capability for SocialSentimentTool {
    fn spec(&self) -> &CapabilitySpec {
        &self.spec
    }

    async fn execute(&self, args: Value) -> Result<Value, CapabilityError> {
        let symbol = symbol_arg(&args, "symbol")?;
        self.cache
            .get_or_fetch(CacheKey::new(GET_SOCIAL_SENTIMENT, &symbol), || async {
                let raw = self.client.social_sentiment(&symbol).await?;
                normalize_social_sentiment(&symbol, &raw)
            })
            .await
            .map_err(CapabilityError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MarketConfig;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(uri: &str) -> Arc<FinnhubClient> {
        let config = MarketConfig::builder()
            .finnhub_api_key("fh")
            .base_url(uri)
            .build()
            .unwrap();
        Arc::new(FinnhubClient::new(&config).unwrap())
    }

    fn cache() -> ResponseCache {
        ResponseCache::new(Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_quote_is_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quote"))
            .and(query_param("symbol", "MSFT"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"c": 410.5, "t": 1_700_000_000})))
            .expect(1)
            .mount(&server)
            .await;

        let tool = StockQuoteTool::new(client(&server.uri()), cache());
        let first = tool.execute(json!({"symbol": "msft"})).await.unwrap();
        let second = tool.execute(json!({"symbol": "MSFT"})).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first["symbol"], "MSFT");
        assert_eq!(first["timestamp"], 1_700_000_000);
    }

    #[tokio::test]
    async fn test_market_news_clamps_limit() {
        let server = MockServer::start().await;
        let articles: Vec<Value> = (0..80).map(|i| json!({"headline": format!("h{i}")})).collect();
        Mock::given(path("/news"))
            .and(query_param("category", "crypto"))
            .respond_with(ResponseTemplate::new(200).set_body_json(articles))
            .mount(&server)
            .await;

        let tool = MarketNewsTool::new(client(&server.uri()), cache());
        let doc = tool
            .execute(json!({"category": "crypto", "limit": 100}))
            .await
            .unwrap();
        assert_eq!(doc["count"], 50);
        assert_eq!(doc["category"], "crypto");
    }

    #[tokio::test]
    async fn test_upstream_error_is_not_cached() {
        let server = MockServer::start().await;
        Mock::given(path("/stock/metric"))
            .respond_with(ResponseTemplate::new(502))
            .expect(2)
            .mount(&server)
            .await;

        let tool = BasicFinancialsTool::new(client(&server.uri()), cache());
        for _ in 0..2 {
            let err = tool.execute(json!({"symbol": "AAPL"})).await.unwrap_err();
            assert_eq!(err.kind(), "upstream");
        }
    }
}
