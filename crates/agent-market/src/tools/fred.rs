//! FRED-backed capabilities: key indicators and arbitrary series

use super::{GET_ECONOMIC_INDICATORS, GET_ECONOMIC_SERIES, bounded_arg, str_arg};
use crate::api::FredClient;
use crate::api::fred::normalize_series;
use crate::cache::{CacheKey, ResponseCache};
use crate::error::MarketError;
use agent_tools::{Capability, CapabilityError, CapabilitySpec, ParamSpec, ParameterSchema};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

const MAX_OBSERVATIONS: u32 = 1000;

/// Latest values of the headline US indicators
pub struct EconomicIndicatorsTool {
    spec: CapabilitySpec,
    client: Arc<FredClient>,
    cache: ResponseCache,
}

impl EconomicIndicatorsTool {
    pub fn new(client: Arc<FredClient>, cache: ResponseCache) -> Self {
        Self {
            spec: CapabilitySpec::new(
                GET_ECONOMIC_INDICATORS,
                "Get the latest values of key US economic indicators: GDP growth, \
                 unemployment, CPI, fed funds rate, 10-year Treasury yield, VIX and \
                 consumer sentiment.",
            ),
            client,
            cache,
        }
    }
}

#[async_trait]
impl Capability for EconomicIndicatorsTool {
    fn spec(&self) -> &CapabilitySpec {
        &self.spec
    }

    async fn execute(&self, _args: Value) -> Result<Value, CapabilityError> {
        self.cache
            .get_or_fetch(CacheKey::new(GET_ECONOMIC_INDICATORS, &()), || {
                self.client.key_indicators()
            })
            .await
            .map_err(CapabilityError::from)
    }
}

/// Recent observations of any FRED series
pub struct EconomicSeriesTool {
    spec: CapabilitySpec,
    client: Arc<FredClient>,
    cache: ResponseCache,
}

impl EconomicSeriesTool {
    pub fn new(client: Arc<FredClient>, cache: ResponseCache) -> Self {
        Self {
            spec: CapabilitySpec::new(
                GET_ECONOMIC_SERIES,
                "Get recent observations of any FRED series, newest first.",
            )
            .parameters(
                ParameterSchema::new()
                    .param(
                        ParamSpec::string("series_id")
                            .describe("FRED series id, e.g. GDP, UNRATE, CPIAUCSL, FEDFUNDS")
                            .required(),
                    )
                    .param(
                        ParamSpec::integer("observation_count")
                            .describe("Number of data points")
                            .default_value(12),
                    ),
            ),
            client,
            cache,
        }
    }
}

#[async_trait]
impl Capability for EconomicSeriesTool {
    fn spec(&self) -> &CapabilitySpec {
        &self.spec
    }

    async fn execute(&self, args: Value) -> Result<Value, CapabilityError> {
        let series_id = str_arg(&args, "series_id")?.trim().to_uppercase();
        if series_id.is_empty() {
            return Err(CapabilityError::Validation(
                "parameter 'series_id' must not be empty".into(),
            ));
        }
        let count = bounded_arg(&args, "observation_count", 1, MAX_OBSERVATIONS)?;

        self.cache
            .get_or_fetch(CacheKey::new(GET_ECONOMIC_SERIES, &json!([series_id, count])), || async {
                let observations = self.client.observations(&series_id, count).await?;
                Ok::<_, MarketError>(normalize_series(&series_id, &observations))
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
    use wiremock::matchers::{path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_series_request() {
        let server = MockServer::start().await;
        Mock::given(path("/series/observations"))
            .and(query_param("series_id", "UNRATE"))
            .and(query_param("limit", "3"))
            .and(query_param("sort_order", "desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"observations": [
                {"date": "2025-03-01", "value": "4.2"},
                {"date": "2025-02-01", "value": "4.1"},
                {"date": "2025-01-01", "value": "."}
            ]})))
            .mount(&server)
            .await;

        let config = MarketConfig::builder()
            .finnhub_api_key("fh")
            .fred_api_key("fred")
            .base_url(server.uri())
            .build()
            .unwrap();
        let tool = EconomicSeriesTool::new(
            Arc::new(FredClient::new(&config).unwrap()),
            ResponseCache::new(Duration::from_secs(60)),
        );

        let doc = tool
            .execute(json!({"series_id": "unrate", "observation_count": 3}))
            .await
            .unwrap();
        assert_eq!(doc["series_id"], "UNRATE");
        assert_eq!(doc["count"], 3);
        assert_eq!(doc["observations"][0], json!({"date": "2025-03-01", "value": 4.2}));
        assert_eq!(doc["observations"][2]["value"], Value::Null);
    }
}
