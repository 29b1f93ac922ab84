//! Federal Reserve Economic Data (FRED) API client
//!
//! FRED is a database maintained by the Federal Reserve Bank of St. Louis
//! containing over 800,000 economic time series from numerous sources.
//!
//! Rate Limit: 120 requests per minute

use super::{SharedRateLimiter, http_client, rate_limiter, read_json};
use crate::config::MarketConfig;
use crate::error::{MarketError, Result};
use agent_utils::Secret;
use futures::future::join_all;
use reqwest::Client;
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{instrument, warn};

const PROVIDER: &str = "FRED";

/// A named economic indicator backed by one FRED series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Indicator {
    pub key: &'static str,
    pub series_id: &'static str,
    pub name: &'static str,
    pub frequency: &'static str,
}

const fn indicator(
    key: &'static str,
    series_id: &'static str,
    name: &'static str,
    frequency: &'static str,
) -> Indicator {
    Indicator {
        key,
        series_id,
        name,
        frequency,
    }
}

/// Indicator catalogue
pub const INDICATORS: &[Indicator] = &[
    indicator("gdp", "GDP", "US GDP (billions of dollars)", "quarterly"),
    indicator("gdp_growth", "A191RL1Q225SBEA", "Real GDP growth rate (%)", "quarterly"),
    indicator("unemployment_rate", "UNRATE", "Unemployment rate (%)", "monthly"),
    indicator("cpi", "CPIAUCSL", "Consumer Price Index (CPI)", "monthly"),
    indicator("cpi_yoy", "CPIAUCSL", "CPI year over year", "monthly"),
    indicator("fed_funds_rate", "FEDFUNDS", "Federal funds rate (%)", "monthly"),
    indicator("treasury_10y", "DGS10", "10-year Treasury yield (%)", "daily"),
    indicator("treasury_2y", "DGS2", "2-year Treasury yield (%)", "daily"),
    indicator("sp500", "SP500", "S&P 500 index", "daily"),
    indicator("vix", "VIXCLS", "VIX volatility index", "daily"),
    indicator("initial_claims", "ICSA", "Initial jobless claims", "weekly"),
    indicator("consumer_sentiment", "UMCSENT", "University of Michigan consumer sentiment", "monthly"),
];

/// Indicators fetched by `get_economic_indicators`
pub const KEY_INDICATORS: &[&str] = &[
    "gdp_growth",
    "unemployment_rate",
    "cpi",
    "fed_funds_rate",
    "treasury_10y",
    "vix",
    "consumer_sentiment",
];

pub fn indicator_by_key(key: &str) -> Option<&'static Indicator> {
    INDICATORS.iter().find(|i| i.key == key)
}

/// FRED API client
pub struct FredClient {
    client: Client,
    base_url: String,
    api_key: Secret,
    rate_limiter: SharedRateLimiter,
}

impl std::fmt::Debug for FredClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FredClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl FredClient {
    pub fn new(config: &MarketConfig) -> Result<Self> {
        let api_key = config
            .fred_api_key
            .clone()
            .ok_or(MarketError::MissingCredential("FRED_API_KEY"))?;

        Ok(Self {
            client: http_client(config.call_timeout),
            base_url: config.endpoints.fred.trim_end_matches('/').to_string(),
            api_key,
            rate_limiter: rate_limiter(config.rate_limits.fred),
        })
    }

    /// Most recent `limit` observations of a series, newest first
    #[instrument(skip(self), fields(provider = PROVIDER))]
    pub async fn observations(&self, series_id: &str, limit: u32) -> Result<Vec<Value>> {
        self.rate_limiter.until_ready().await;

        let limit = limit.to_string();
        let response = self
            .client
            .get(format!("{}/series/observations", self.base_url))
            .query(&[
                ("series_id", series_id),
                ("api_key", self.api_key.expose()),
                ("file_type", "json"),
                ("sort_order", "desc"),
                ("limit", &limit),
            ])
            .send()
            .await
            .map_err(|e| MarketError::transport(PROVIDER, &e))?;

        let data = read_json(PROVIDER, response).await?;
        match data.get("observations") {
            Some(Value::Array(observations)) => Ok(observations.clone()),
            Some(_) => Err(MarketError::parse(PROVIDER, "observations is not a list")),
            None => Ok(Vec::new()),
        }
    }

    /// Latest value of each key indicator
    ///
    /// A failing indicator is reported inline with `value: null` and an
    /// `error`; the call as a whole only fails when every indicator does.
    pub async fn key_indicators(&self) -> Result<Value> {
        let selected: Vec<&Indicator> = KEY_INDICATORS
            .iter()
            .filter_map(|key| indicator_by_key(key))
            .collect();

        let fetched = join_all(selected.iter().map(|i| self.observations(i.series_id, 1))).await;

        let mut indicators = Map::new();
        let mut last_error = None;
        let mut failures = 0;
        for (info, result) in selected.iter().zip(fetched) {
            let entry = match result {
                Ok(observations) => latest_entry(info, observations.first()),
                Err(e) => {
                    warn!(indicator = info.key, error = %e, "Indicator unavailable");
                    failures += 1;
                    let entry = json!({
                        "name": info.name,
                        "value": null,
                        "date": null,
                        "frequency": info.frequency,
                        "error": e.to_string(),
                    });
                    last_error = Some(e);
                    entry
                }
            };
            indicators.insert(info.key.to_string(), entry);
        }

        match last_error {
            Some(e) if failures == selected.len() => Err(e),
            _ => Ok(json!({ "indicators": indicators })),
        }
    }
}

/// FRED reports missing values as "."
pub fn parse_value(raw: Option<&Value>) -> Option<f64> {
    match raw? {
        Value::String(s) if s == "." => None,
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

fn latest_entry(info: &Indicator, latest: Option<&Value>) -> Value {
    json!({
        "name": info.name,
        "value": latest.and_then(|o| parse_value(o.get("value"))),
        "date": latest.and_then(|o| o.get("date")).cloned().unwrap_or(Value::Null),
        "frequency": info.frequency,
    })
}

pub fn normalize_series(series_id: &str, observations: &[Value]) -> Value {
    let observations: Vec<Value> = observations
        .iter()
        .map(|o| {
            json!({
                "date": o.get("date").cloned().unwrap_or(Value::Null),
                "value": parse_value(o.get("value")),
            })
        })
        .collect();

    json!({
        "series_id": series_id,
        "count": observations.len(),
        "observations": observations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(uri: &str) -> FredClient {
        let config = MarketConfig::builder()
            .finnhub_api_key("fh")
            .fred_api_key("fred-key")
            .base_url(uri)
            .build()
            .unwrap();
        FredClient::new(&config).unwrap()
    }

    #[test]
    fn test_catalogue() {
        assert_eq!(INDICATORS.len(), 12);
        assert_eq!(indicator_by_key("vix").unwrap().series_id, "VIXCLS");
        assert!(KEY_INDICATORS.iter().all(|k| indicator_by_key(k).is_some()));
    }

    #[test]
    fn test_missing_values() {
        assert_eq!(parse_value(Some(&json!("."))), None);
        assert_eq!(parse_value(Some(&json!("4.33"))), Some(4.33));
        assert_eq!(parse_value(None), None);

        let doc = normalize_series("UNRATE", &[json!({"date": "2025-01-01", "value": "."})]);
        assert_eq!(doc["count"], 1);
        assert_eq!(doc["observations"][0]["value"], Value::Null);
    }

    #[tokio::test]
    async fn test_key_indicators_degrade_per_indicator() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/series/observations"))
            .and(query_param("series_id", "VIXCLS"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/series/observations"))
            .and(query_param("api_key", "fred-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "observations": [{"date": "2025-06-01", "value": "4.2"}]
            })))
            .mount(&server)
            .await;

        let doc = client(&server.uri()).key_indicators().await.unwrap();
        let indicators = doc["indicators"].as_object().unwrap();
        assert_eq!(indicators.len(), KEY_INDICATORS.len());
        assert_eq!(indicators["unemployment_rate"]["value"], 4.2);
        assert_eq!(indicators["unemployment_rate"]["frequency"], "monthly");
        assert_eq!(indicators["vix"]["value"], Value::Null);
        assert!(indicators["vix"]["error"].as_str().unwrap().contains("500"));
        assert_eq!(
            indicators["vix"]["frequency"],
            indicator_by_key("vix").unwrap().frequency
        );
    }

    #[tokio::test]
    async fn test_key_indicators_fail_when_all_fail() {
        let server = MockServer::start().await;
        Mock::given(path("/series/observations"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        assert!(client(&server.uri()).key_indicators().await.is_err());
    }
}
