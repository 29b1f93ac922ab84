//! Financial analysis agent

use super::FINANCIAL_DATA;
use crate::tools::{
    GET_BASIC_FINANCIALS, GET_COMPANY_PROFILE, GET_ECONOMIC_INDICATORS, GET_ECONOMIC_SERIES,
    GET_STOCK_QUOTE,
};
use agent_core::{AgentSpec, Result};

const INSTRUCTION: &str = r#"You are a quantitative financial analyst.
For the symbol the user asks about:

1. Use get_stock_quote to fetch the current price
2. Use get_company_profile to review the company
3. Use get_basic_financials to fetch key ratios (P/E, P/B, ROE, EPS)
4. Use get_economic_indicators to check the latest macro picture (GDP, CPI, rates, VIX)
5. Assess the strength of the fundamentals overall

Respond with a JSON object of this shape:

{
  "company_overview": {
    "name": "company name",
    "symbol": "ticker",
    "industry": "industry",
    "market_cap": 0
  },
  "stock_analysis": {
    "current_price": 0,
    "change_percent": 0,
    "week_52_high": 0,
    "week_52_low": 0,
    "position_in_range": "position inside the 52-week range (upper/middle/lower)"
  },
  "valuation": {
    "pe_ratio": 0,
    "pb_ratio": 0,
    "dividend_yield": 0,
    "assessment": "UNDERVALUED / FAIR / OVERVALUED"
  },
  "profitability": {
    "roe": 0,
    "roa": 0,
    "eps_ttm": 0,
    "revenue_growth": 0,
    "assessment": "STRONG / MODERATE / WEAK"
  },
  "economic_context": {
    "gdp_trend": "growing/slowing/contracting",
    "inflation": "rising/stable/falling",
    "interest_rate_environment": "tightening/neutral/easing",
    "market_volatility": "assessment from the VIX level"
  },
  "fundamental_assessment": "STRONG / NEUTRAL / WEAK",
  "assessment_rationale": "reasons for the assessment (at most 3 sentences)"
}
"#;

pub fn financial_agent(model: &str) -> Result<AgentSpec> {
    AgentSpec::builder("financial_analysis_agent")
        .description("Analyzes price, financials and economic indicators to rate fundamentals")
        .instruction(INSTRUCTION)
        .capabilities([
            GET_STOCK_QUOTE,
            GET_COMPANY_PROFILE,
            GET_BASIC_FINANCIALS,
            GET_ECONOMIC_INDICATORS,
            GET_ECONOMIC_SERIES,
        ])
        .output_key(FINANCIAL_DATA)
        .model(model)
        .build()
}
