//! Market intelligence agents
//!
//! Three data-gathering agents feed two analysis agents:
//!
//! | agent | reads | writes |
//! |---|---|---|
//! | `news_social_media_agent` | | `news_data` |
//! | `financial_analysis_agent` | | `financial_data` |
//! | `sentiment_agent` | | `sentiment_data` |
//! | `trend_analysis_agent` | the three above | `trend_analysis` |
//! | `strategy_agent` | all four above | `strategy_report` |

pub mod financial;
pub mod news;
pub mod sentiment;
pub mod strategy;
pub mod trend;

pub use financial::financial_agent;
pub use news::news_agent;
pub use sentiment::sentiment_agent;
pub use strategy::strategy_agent;
pub use trend::trend_agent;

use agent_core::{AgentSpec, Result};

pub const NEWS_DATA: &str = "news_data";
pub const FINANCIAL_DATA: &str = "financial_data";
pub const SENTIMENT_DATA: &str = "sentiment_data";
pub const TREND_ANALYSIS: &str = "trend_analysis";
pub const STRATEGY_REPORT: &str = "strategy_report";

/// Output keys in pipeline order
pub const STATE_KEYS: [&str; 5] = [
    NEWS_DATA,
    FINANCIAL_DATA,
    SENTIMENT_DATA,
    TREND_ANALYSIS,
    STRATEGY_REPORT,
];

/// All five specs in pipeline order, bound to `model`
pub fn market_agent_specs(model: &str) -> Result<Vec<AgentSpec>> {
    Ok(vec![
        news_agent(model)?,
        financial_agent(model)?,
        sentiment_agent(model)?,
        trend_agent(model)?,
        strategy_agent(model)?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::all_capability_names;
    use std::collections::BTreeSet;

    #[test]
    fn test_specs_write_state_keys_in_order() {
        let specs = market_agent_specs("gemini-2.0-flash").unwrap();
        let keys: Vec<&str> = specs.iter().map(AgentSpec::output_key).collect();
        assert_eq!(keys, STATE_KEYS);
        assert!(specs.iter().all(|s| s.model() == Some("gemini-2.0-flash")));
    }

    #[test]
    fn test_gathering_agents_read_nothing() {
        let specs = market_agent_specs("m").unwrap();
        for spec in &specs[..3] {
            assert!(spec.reads().is_empty(), "{} reads {:?}", spec.name(), spec.reads());
            assert!(!spec.capabilities().is_empty());
        }
    }

    #[test]
    fn test_analysis_agents_reads() {
        let specs = market_agent_specs("m").unwrap();

        let trend: BTreeSet<&str> = specs[3].reads().iter().map(String::as_str).collect();
        assert_eq!(trend, BTreeSet::from([NEWS_DATA, FINANCIAL_DATA, SENTIMENT_DATA]));
        assert!(specs[3].capabilities().is_empty());

        let strategy: BTreeSet<&str> = specs[4].reads().iter().map(String::as_str).collect();
        assert_eq!(
            strategy,
            BTreeSet::from([NEWS_DATA, FINANCIAL_DATA, SENTIMENT_DATA, TREND_ANALYSIS])
        );
    }

    #[test]
    fn test_capabilities_are_known() {
        let known = all_capability_names();
        for spec in market_agent_specs("m").unwrap() {
            for cap in spec.capabilities() {
                assert!(known.contains(&cap.as_str()), "unknown capability {cap}");
            }
        }
    }
}
