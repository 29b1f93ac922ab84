//! API clients for market data providers
//!
//! Each client owns a rate limiter sized from [`RateLimits`](crate::config::RateLimits)
//! and returns raw provider JSON; the `normalize_*` functions next to each
//! client turn that into the documents agents see.

pub mod finnhub;
pub mod fred;
pub mod marketaux;
pub mod reddit;

pub use finnhub::FinnhubClient;
pub use fred::{FredClient, INDICATORS, Indicator, KEY_INDICATORS};
pub use marketaux::MarketauxClient;
pub use reddit::RedditClient;

use crate::error::{MarketError, Result};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

pub(crate) type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

const ERROR_BODY_LIMIT: usize = 200;

pub(crate) fn rate_limiter(per_minute: u32) -> SharedRateLimiter {
    let quota = Quota::per_minute(NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

pub(crate) fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

/// Check the status and decode the body as JSON
pub(crate) async fn read_json(provider: &'static str, response: Response) -> Result<Value> {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(MarketError::RateLimited { provider });
    }

    let body = response
        .text()
        .await
        .map_err(|e| MarketError::transport(provider, &e))?;

    if !status.is_success() {
        return Err(MarketError::Status {
            provider,
            status: status.as_u16(),
            body: truncate(&body, ERROR_BODY_LIMIT),
        });
    }

    serde_json::from_str(&body).map_err(|e| MarketError::parse(provider, e.to_string()))
}

/// First `max` characters of `text`
pub(crate) fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Round to four decimals, the precision scores are reported with
pub(crate) fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate("héllo wörld", 5), "héllo");
        assert_eq!(truncate("short", 300), "short");
    }

    #[test]
    fn test_round4() {
        assert!((round4(0.123_456) - 0.1235).abs() < f64::EPSILON);
    }
}
