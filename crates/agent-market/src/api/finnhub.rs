//! Finnhub API client
//!
//! Quotes, company profiles, basic financials, market and company news,
//! and social sentiment. The API key travels as the `token` query parameter.
//!
//! Rate Limit: 60 requests per minute on the free tier

use super::{SharedRateLimiter, http_client, rate_limiter, read_json, round4, truncate};
use crate::config::MarketConfig;
use crate::error::{MarketError, Result};
use agent_utils::Secret;
use chrono::{NaiveDate, TimeDelta, Utc};
use reqwest::Client;
use serde_json::{Map, Value, json};
use tracing::instrument;

const PROVIDER: &str = "Finnhub";
const SUMMARY_LIMIT: usize = 300;

/// Finnhub client with rate limiting
pub struct FinnhubClient {
    client: Client,
    base_url: String,
    api_key: Secret,
    rate_limiter: SharedRateLimiter,
}

impl std::fmt::Debug for FinnhubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinnhubClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl FinnhubClient {
    /// Create a client from the configuration
    pub fn new(config: &MarketConfig) -> Result<Self> {
        let api_key = config
            .finnhub_api_key
            .clone()
            .ok_or(MarketError::MissingCredential("FINNHUB_API_KEY"))?;

        Ok(Self {
            client: http_client(config.call_timeout),
            base_url: config.endpoints.finnhub.trim_end_matches('/').to_string(),
            api_key,
            rate_limiter: rate_limiter(config.rate_limits.finnhub),
        })
    }

    async fn get(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Value> {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(format!("{}{endpoint}", self.base_url))
            .query(params)
            .query(&[("token", self.api_key.expose())])
            .send()
            .await
            .map_err(|e| MarketError::transport(PROVIDER, &e))?;

        read_json(PROVIDER, response).await
    }

    #[instrument(skip(self), fields(provider = PROVIDER))]
    pub async fn quote(&self, symbol: &str) -> Result<Value> {
        self.get("/quote", &[("symbol", symbol)]).await
    }

    #[instrument(skip(self), fields(provider = PROVIDER))]
    pub async fn profile(&self, symbol: &str) -> Result<Value> {
        self.get("/stock/profile2", &[("symbol", symbol)]).await
    }

    #[instrument(skip(self), fields(provider = PROVIDER))]
    pub async fn metrics(&self, symbol: &str) -> Result<Value> {
        self.get("/stock/metric", &[("symbol", symbol), ("metric", "all")])
            .await
    }

    /// Market news for a category (general, forex, crypto, merger)
    #[instrument(skip(self), fields(provider = PROVIDER))]
    pub async fn market_news(&self, category: &str) -> Result<Value> {
        self.get("/news", &[("category", category)]).await
    }

    /// Company news between two dates, inclusive
    #[instrument(skip(self), fields(provider = PROVIDER))]
    pub async fn company_news(&self, symbol: &str, from: NaiveDate, to: NaiveDate) -> Result<Value> {
        let from = from.format("%Y-%m-%d").to_string();
        let to = to.format("%Y-%m-%d").to_string();
        self.get(
            "/company-news",
            &[("symbol", symbol), ("from", &from), ("to", &to)],
        )
        .await
    }

    #[instrument(skip(self), fields(provider = PROVIDER))]
    pub async fn social_sentiment(&self, symbol: &str) -> Result<Value> {
        self.get("/stock/social-sentiment", &[("symbol", symbol)])
            .await
    }
}

/// Date window ending today covering the last `days` days
pub fn news_window(days: u32) -> (NaiveDate, NaiveDate) {
    let to = Utc::now().date_naive();
    let from = to
        .checked_sub_signed(TimeDelta::days(i64::from(days)))
        .unwrap_or(NaiveDate::MIN);
    (from, to)
}

fn field(data: &Value, key: &str) -> Value {
    data.get(key).cloned().unwrap_or(Value::Null)
}

fn require_object<'a>(data: &'a Value, what: &str) -> Result<&'a Map<String, Value>> {
    data.as_object()
        .ok_or_else(|| MarketError::parse(PROVIDER, format!("{what}: expected an object")))
}

pub fn normalize_quote(symbol: &str, data: &Value) -> Result<Value> {
    require_object(data, "quote")?;
    Ok(json!({
        "symbol": symbol,
        "current_price": field(data, "c"),
        "change": field(data, "d"),
        "percent_change": field(data, "dp"),
        "high": field(data, "h"),
        "low": field(data, "l"),
        "open": field(data, "o"),
        "previous_close": field(data, "pc"),
        "timestamp": field(data, "t"),
    }))
}

pub fn normalize_profile(symbol: &str, data: &Value) -> Result<Value> {
    require_object(data, "profile")?;
    Ok(json!({
        "symbol": symbol,
        "name": field(data, "name"),
        "industry": field(data, "finnhubIndustry"),
        "market_cap": field(data, "marketCapitalization"),
        "ipo_date": field(data, "ipo"),
        "logo": field(data, "logo"),
        "country": field(data, "country"),
        "exchange": field(data, "exchange"),
        "web_url": field(data, "weburl"),
    }))
}

pub fn normalize_financials(symbol: &str, data: &Value) -> Result<Value> {
    require_object(data, "metric")?;
    let metric = data.get("metric").cloned().unwrap_or_else(|| json!({}));
    Ok(json!({
        "symbol": symbol,
        "pe_ratio": field(&metric, "peBasicExclExtraTTM"),
        "pb_ratio": field(&metric, "pbAnnual"),
        "dividend_yield": field(&metric, "dividendYieldIndicatedAnnual"),
        "roe": field(&metric, "roeTTM"),
        "roa": field(&metric, "roaTTM"),
        "eps_ttm": field(&metric, "epsBasicExclExtraItemsTTM"),
        "revenue_growth_ttm": field(&metric, "revenueGrowthTTMYoy"),
        "week_52_high": field(&metric, "52WeekHigh"),
        "week_52_low": field(&metric, "52WeekLow"),
        "beta": field(&metric, "beta"),
    }))
}

/// First `limit` articles; anything but a list counts as no articles
fn articles(data: &Value, limit: usize, with_related: bool) -> Vec<Value> {
    data.as_array()
        .map(|items| {
            items
                .iter()
                .take(limit)
                .map(|a| {
                    let summary = a.get("summary").and_then(Value::as_str).unwrap_or_default();
                    let mut article = json!({
                        "headline": field(a, "headline"),
                        "summary": truncate(summary, SUMMARY_LIMIT),
                        "source": field(a, "source"),
                        "url": field(a, "url"),
                        "datetime": field(a, "datetime"),
                    });
                    if with_related {
                        article["related"] = field(a, "related");
                    }
                    article
                })
                .collect()
        })
        .unwrap_or_default()
}

pub fn normalize_market_news(category: &str, limit: usize, data: &Value) -> Value {
    let articles = articles(data, limit, true);
    json!({
        "category": category,
        "count": articles.len(),
        "articles": articles,
    })
}

pub fn normalize_company_news(
    symbol: &str,
    (from, to): (NaiveDate, NaiveDate),
    limit: usize,
    data: &Value,
) -> Value {
    let articles = articles(data, limit, false);
    json!({
        "symbol": symbol,
        "period": format!("{} ~ {}", from.format("%Y-%m-%d"), to.format("%Y-%m-%d")),
        "count": articles.len(),
        "articles": articles,
    })
}

fn summarize_sentiment(entries: Option<&Value>) -> Value {
    let entries = entries.and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default();
    if entries.is_empty() {
        return json!({ "mentions": 0, "positive_score": 0, "negative_score": 0 });
    }

    let number = |e: &Value, key: &str| e.get(key).and_then(Value::as_f64).unwrap_or(0.0);
    let count = entries.len() as f64;
    let mentions: i64 = entries
        .iter()
        .map(|e| e.get("mention").and_then(Value::as_i64).unwrap_or(0))
        .sum();
    let positive = entries.iter().map(|e| number(e, "positiveScore")).sum::<f64>() / count;
    let negative = entries.iter().map(|e| number(e, "negativeScore")).sum::<f64>() / count;

    json!({
        "mentions": mentions,
        "positive_score": round4(positive),
        "negative_score": round4(negative),
    })
}

pub fn normalize_social_sentiment(symbol: &str, data: &Value) -> Result<Value> {
    require_object(data, "social sentiment")?;
    Ok(json!({
        "symbol": symbol,
        "reddit": summarize_sentiment(data.get("reddit")),
        "twitter": summarize_sentiment(data.get("twitter")),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(uri: &str) -> MarketConfig {
        MarketConfig::builder()
            .finnhub_api_key("test-token")
            .base_url(uri)
            .build()
            .unwrap()
    }

    #[test]
    fn test_normalize_quote() {
        let raw = json!({"c": 150.0, "d": 1.2, "dp": 0.8, "h": 151, "l": 149, "o": 150, "pc": 148.8});
        let quote = normalize_quote("AAPL", &raw).unwrap();
        assert_eq!(
            quote,
            json!({
                "symbol": "AAPL",
                "current_price": 150.0,
                "change": 1.2,
                "percent_change": 0.8,
                "high": 151,
                "low": 149,
                "open": 150,
                "previous_close": 148.8,
                "timestamp": null,
            })
        );
        assert!(normalize_quote("AAPL", &json!([])).is_err());
    }

    #[test]
    fn test_normalize_financials_maps_metric_names() {
        let raw = json!({"metric": {"peBasicExclExtraTTM": 29.1, "52WeekHigh": 199.6, "beta": 1.2}});
        let doc = normalize_financials("AAPL", &raw).unwrap();
        assert_eq!(doc["pe_ratio"], 29.1);
        assert_eq!(doc["week_52_high"], 199.6);
        assert_eq!(doc["roe"], Value::Null);
    }

    #[test]
    fn test_market_news_limit_and_summary_truncation() {
        let long = "x".repeat(500);
        let raw: Vec<Value> = (0..5)
            .map(|i| json!({"headline": format!("h{i}"), "summary": long, "related": "AAPL"}))
            .collect();
        let doc = normalize_market_news("general", 3, &Value::Array(raw));
        assert_eq!(doc["count"], 3);
        assert_eq!(doc["articles"][0]["summary"].as_str().unwrap().len(), 300);
        assert_eq!(doc["articles"][2]["related"], "AAPL");

        let empty = normalize_market_news("forex", 10, &json!({"error": "nope"}));
        assert_eq!(empty["count"], 0);
    }

    #[test]
    fn test_social_sentiment_summary() {
        let raw = json!({
            "reddit": [
                {"mention": 10, "positiveScore": 0.5, "negativeScore": 0.1},
                {"mention": 4, "positiveScore": 0.25, "negativeScore": 0.2}
            ],
            "twitter": []
        });
        let doc = normalize_social_sentiment("TSLA", &raw).unwrap();
        assert_eq!(doc["reddit"]["mentions"], 14);
        assert_eq!(doc["reddit"]["positive_score"], 0.375);
        assert_eq!(doc["reddit"]["negative_score"], 0.15);
        assert_eq!(doc["twitter"], json!({"mentions": 0, "positive_score": 0, "negative_score": 0}));
    }

    #[test]
    fn test_company_news_period() {
        let from = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2025, 1, 8).unwrap();
        let doc = normalize_company_news("AAPL", (from, to), 10, &json!([]));
        assert_eq!(doc["period"], "2025-01-01 ~ 2025-01-08");
    }

    #[tokio::test]
    async fn test_quote_sends_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quote"))
            .and(query_param("symbol", "AAPL"))
            .and(query_param("token", "test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"c": 150.0})))
            .expect(1)
            .mount(&server)
            .await;

        let client = FinnhubClient::new(&config(&server.uri())).unwrap();
        let raw = client.quote("AAPL").await.unwrap();
        assert_eq!(raw["c"], 150.0);
    }

    #[tokio::test]
    async fn test_status_errors() {
        let server = MockServer::start().await;
        Mock::given(path("/stock/profile2"))
            .respond_with(ResponseTemplate::new(403).set_body_string("no access"))
            .mount(&server)
            .await;
        Mock::given(path("/quote"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;
        Mock::given(path("/news"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = FinnhubClient::new(&config(&server.uri())).unwrap();
        assert!(matches!(
            client.profile("AAPL").await.unwrap_err(),
            MarketError::Status { status: 403, .. }
        ));
        assert!(matches!(
            client.quote("AAPL").await.unwrap_err(),
            MarketError::RateLimited { .. }
        ));
        assert!(matches!(
            client.market_news("general").await.unwrap_err(),
            MarketError::Parse { .. }
        ));
    }
}
