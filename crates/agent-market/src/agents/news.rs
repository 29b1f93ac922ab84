//! News and social media agent

use super::NEWS_DATA;
use crate::tools::{GET_COMPANY_NEWS, GET_FINANCIAL_NEWS_WITH_SENTIMENT, GET_MARKET_NEWS};
use agent_core::{AgentSpec, Result};

const INSTRUCTION: &str = r#"You are a market news analyst.
For the symbols and sectors the user asks about:

1. Use get_market_news to fetch the latest market-wide news
2. Use get_company_news to fetch news about the target company
3. Use get_financial_news_with_sentiment to fetch news with sentiment scores
4. Identify important events (earnings, M&A, regulatory changes, product launches)
5. Rate the market impact of each item as HIGH, MEDIUM or LOW

Respond with a JSON object of this shape:

{
  "summary": "overall summary of the market news (at most 3 sentences)",
  "key_events": [
    {"event": "event name", "impact": "HIGH/MEDIUM/LOW", "description": "what happened"}
  ],
  "news_items": [
    {
      "headline": "headline",
      "source": "source name",
      "impact": "HIGH/MEDIUM/LOW",
      "sentiment": "positive/neutral/negative",
      "sentiment_score": 0.0,
      "relevance": "how it relates to the target symbol"
    }
  ],
  "market_mood": "RISK_ON / NEUTRAL / RISK_OFF"
}
"#;

pub fn news_agent(model: &str) -> Result<AgentSpec> {
    AgentSpec::builder("news_social_media_agent")
        .description("Collects industry news and events and rates their market impact")
        .instruction(INSTRUCTION)
        .capabilities([GET_MARKET_NEWS, GET_COMPANY_NEWS, GET_FINANCIAL_NEWS_WITH_SENTIMENT])
        .output_key(NEWS_DATA)
        .model(model)
        .build()
}
