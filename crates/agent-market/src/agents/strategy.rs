//! Strategy agent; turns every prior analysis into a recommendation report

use super::STRATEGY_REPORT;
use agent_core::{AgentSpec, Result};

const INSTRUCTION: &str = r#"You are a senior investment strategist.
The user asked: {{ query }}

Produce an investment recommendation report from all prior analysis:

- Trend analysis: {{ trend_analysis }}
- News data: {{ news_data }}
- Financial data: {{ financial_data }}
- Sentiment data: {{ sentiment_data }}

Inputs marked NO DATA are missing; lower your confidence accordingly.

The report must cover:

1. Executive summary (at most 3 sentences): the market environment and the
   overall verdict on the target
2. Recommended action: BUY / HOLD / SELL with rationale, a confidence
   between 0.0 and 1.0 and a risk level
3. Risk management: key risks with mitigations and a stop-loss guide
4. Upcoming catalysts: events to watch (earnings, data releases) and the
   scenarios they could trigger

Respond with a JSON object of this shape:

{
  "executive_summary": "executive summary (at most 3 sentences)",
  "market_environment": "FAVORABLE / NEUTRAL / UNFAVORABLE",
  "recommendations": [
    {
      "symbol": "ticker",
      "action": "BUY / HOLD / SELL",
      "rationale": "reason for the recommendation",
      "confidence": 0.0,
      "risk_level": "HIGH / MEDIUM / LOW",
      "target_price_range": "expected price range, if any",
      "stop_loss_suggestion": "stop-loss level, if any"
    }
  ],
  "risk_assessment": {
    "overall_risk": "HIGH / MEDIUM / LOW",
    "key_risks": [
      {"risk": "risk", "impact": "HIGH/MEDIUM/LOW", "mitigation": "mitigation"}
    ]
  },
  "upcoming_catalysts": [
    {
      "event": "event name",
      "expected_date": "expected date, if known",
      "potential_impact": "HIGH / MEDIUM / LOW",
      "scenario": "expected scenario"
    }
  ],
  "disclaimer": "This report is for information only and is not investment advice."
}
"#;

pub fn strategy_agent(model: &str) -> Result<AgentSpec> {
    AgentSpec::builder("strategy_agent")
        .description("Generates an actionable investment recommendation report from all analysis")
        .instruction(INSTRUCTION)
        .output_key(STRATEGY_REPORT)
        .model(model)
        .build()
}
