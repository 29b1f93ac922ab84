use agent_core::NO_DATA;
use agent_market::agents::{FINANCIAL_DATA, NEWS_DATA, SENTIMENT_DATA, STRATEGY_REPORT, TREND_ANALYSIS};
use agent_market::{MarketConfig, build_market_pipeline, market_capabilities};
use agent_runtime::{Script, ScriptedExecutor};
use agent_workflow::{EventType, Runner};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(uri: &str) -> MarketConfig {
    MarketConfig::builder()
        .finnhub_api_key("test-token")
        .base_url(uri)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_aapl_quote() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quote"))
        .and(query_param("symbol", "AAPL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "c": 150.0, "d": 1.2, "dp": 0.8, "h": 151, "l": 149, "o": 150, "pc": 148.8
        })))
        .mount(&server)
        .await;

    let registry = market_capabilities(&config(&server.uri())).unwrap();
    let out = registry.dispatch("get_stock_quote", &json!({"symbol": "AAPL"})).await;

    assert!(!out.is_error);
    assert_eq!(
        out.result,
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
}

#[tokio::test]
async fn test_missing_symbol_is_validation_document() {
    let server = MockServer::start().await;
    let registry = market_capabilities(&config(&server.uri())).unwrap();

    let out = registry.dispatch("get_company_profile", &json!({})).await;
    assert!(out.is_error);
    assert_eq!(out.result["error_kind"], "validation");

    let out = registry
        .dispatch("get_market_news", &json!({"category": "sports"}))
        .await;
    assert_eq!(out.result["error_kind"], "validation");
}

#[tokio::test]
async fn test_whole_float_limit_is_accepted() {
    let server = MockServer::start().await;
    let articles: Vec<_> = (0..8).map(|i| json!({"headline": format!("h{i}")})).collect();
    Mock::given(method("GET"))
        .and(path("/news"))
        .respond_with(ResponseTemplate::new(200).set_body_json(articles))
        .mount(&server)
        .await;

    let registry = market_capabilities(&config(&server.uri())).unwrap();
    let out = registry.dispatch("get_market_news", &json!({"limit": 5.0})).await;

    assert!(!out.is_error, "{}", out.result);
    assert_eq!(out.result["count"], 5);
}

#[tokio::test]
async fn test_unconfigured_provider_is_unknown_at_dispatch() {
    let server = MockServer::start().await;
    let registry = market_capabilities(&config(&server.uri())).unwrap();

    let out = registry.dispatch("get_economic_indicators", &json!({})).await;
    assert_eq!(out.result["error_kind"], "unknown_capability");
    assert!(registry.unavailable_reason("get_economic_indicators").is_some());
}

#[tokio::test]
async fn test_pipeline_against_mock_providers() {
    let server = MockServer::start().await;
    Mock::given(path("/quote"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"c": 150.0, "dp": 0.8})))
        .mount(&server)
        .await;
    Mock::given(path("/news"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"headline": "Markets rally", "summary": "Stocks up", "source": "Wire"}
        ])))
        .mount(&server)
        .await;

    let executor = Arc::new(
        ScriptedExecutor::new()
            .script(
                "news_social_media_agent",
                Script::new()
                    .call("get_market_news", json!({}))
                    .call("get_financial_news_with_sentiment", json!({"symbols": "AAPL"})),
            )
            .script(
                "financial_analysis_agent",
                Script::new().call("get_stock_quote", json!({"symbol": "AAPL"})),
            )
            .script("sentiment_agent", Script::new().fail("model refused"))
            .script(
                "trend_analysis_agent",
                Script::new().respond(json!({"key_insight": "momentum"})),
            )
            .script(
                "strategy_agent",
                Script::new().respond(json!({"recommendations": [{"symbol": "AAPL", "action": "HOLD"}]})),
            ),
    );

    let pipeline = build_market_pipeline(&config(&server.uri()), executor.clone()).unwrap();
    let session = Runner::new(pipeline).run("Analyze Apple (AAPL)").await;

    let state = session.state();
    assert_eq!(state[NEWS_DATA]["results"]["get_market_news"]["count"], 1);
    assert!(state[NEWS_DATA]["results"].get("get_financial_news_with_sentiment").is_none());
    assert_eq!(state[FINANCIAL_DATA]["results"]["get_stock_quote"]["current_price"], 150.0);
    assert_eq!(session.unwritten_keys(), vec![SENTIMENT_DATA.to_string()]);
    assert_eq!(state[TREND_ANALYSIS]["key_insight"], "momentum");
    assert_eq!(session.final_output().unwrap()["recommendations"][0]["action"], "HOLD");
    assert!(state.contains_key(STRATEGY_REPORT));

    let trend = executor.recorded_for("trend_analysis_agent").unwrap();
    assert!(trend.instruction.contains(&format!("Sentiment data: {NO_DATA}")));
    assert!(trend.instruction.contains("Analyze Apple (AAPL)"));
    assert!(trend.capabilities.is_empty());

    let sentiment = executor.recorded_for("sentiment_agent").unwrap();
    assert_eq!(sentiment.capabilities, vec!["get_social_sentiment".to_string()]);

    let tool_calls = session
        .events
        .iter()
        .filter(|e| e.event_type == EventType::ToolCall)
        .count();
    assert_eq!(tool_calls, 2);
}
