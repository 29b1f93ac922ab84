//! Reddit API client
//!
//! Application-only OAuth: the client id and secret are exchanged for a
//! bearer token (client-credentials grant) which is cached until shortly
//! before it expires.
//!
//! Rate Limit: 100 requests per minute with OAuth

use super::{SharedRateLimiter, http_client, rate_limiter, read_json, truncate};
use crate::config::MarketConfig;
use crate::error::{MarketError, Result};
use agent_utils::Secret;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

const PROVIDER: &str = "Reddit";
const SELFTEXT_LIMIT: usize = 500;
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expiry")]
    expires_in: u64,
}

fn default_expiry() -> u64 {
    3600
}

struct CachedToken {
    token: Secret,
    expires_at: Instant,
}

/// Reddit client
pub struct RedditClient {
    client: Client,
    api_base: String,
    auth_base: String,
    client_id: Secret,
    client_secret: Secret,
    user_agent: String,
    token: Mutex<Option<CachedToken>>,
    rate_limiter: SharedRateLimiter,
}

impl std::fmt::Debug for RedditClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditClient")
            .field("api_base", &self.api_base)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

impl RedditClient {
    pub fn new(config: &MarketConfig) -> Result<Self> {
        let (id, secret) = config
            .reddit_credentials()
            .ok_or(MarketError::MissingCredential("REDDIT_CLIENT_ID / REDDIT_CLIENT_SECRET"))?;

        Ok(Self {
            client: http_client(config.call_timeout),
            api_base: config.endpoints.reddit_api.trim_end_matches('/').to_string(),
            auth_base: config.endpoints.reddit_auth.trim_end_matches('/').to_string(),
            client_id: id.clone(),
            client_secret: secret.clone(),
            user_agent: config.reddit_user_agent.clone(),
            token: Mutex::new(None),
            rate_limiter: rate_limiter(config.rate_limits.reddit),
        })
    }

    /// Current bearer token, fetching a new one when missing or about to expire
    async fn access_token(&self) -> Result<Secret> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() + TOKEN_REFRESH_MARGIN < token.expires_at {
                return Ok(token.token.clone());
            }
        }

        debug!("Requesting Reddit access token");
        self.rate_limiter.until_ready().await;
        let response = self
            .client
            .post(format!("{}/api/v1/access_token", self.auth_base))
            .basic_auth(self.client_id.expose(), Some(self.client_secret.expose()))
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| MarketError::transport(PROVIDER, &e))?;

        let body = read_json(PROVIDER, response).await?;
        let parsed: TokenResponse = serde_json::from_value(body)
            .map_err(|e| MarketError::parse(PROVIDER, format!("token response: {e}")))?;

        let token = Secret::new(parsed.access_token);
        *cached = Some(CachedToken {
            token: token.clone(),
            expires_at: Instant::now() + Duration::from_secs(parsed.expires_in),
        });
        Ok(token)
    }

    async fn listing(&self, path: &str, params: &[(&str, &str)]) -> Result<Value> {
        let token = self.access_token().await?;
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(format!("{}{path}", self.api_base))
            .bearer_auth(token.expose())
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .query(params)
            .send()
            .await
            .map_err(|e| MarketError::transport(PROVIDER, &e))?;

        read_json(PROVIDER, response).await
    }

    /// Hot posts of one subreddit, raw listing
    #[instrument(skip(self), fields(provider = PROVIDER))]
    pub async fn hot(&self, subreddit: &str, limit: u32) -> Result<Value> {
        let limit = limit.to_string();
        self.listing(&format!("/r/{subreddit}/hot"), &[("limit", &limit)])
            .await
    }

    /// Search within one subreddit, raw listing
    #[instrument(skip(self), fields(provider = PROVIDER))]
    pub async fn search(&self, subreddit: &str, query: &str, sort: &str, limit: u32) -> Result<Value> {
        let limit = limit.to_string();
        self.listing(
            &format!("/r/{subreddit}/search"),
            &[
                ("q", query),
                ("sort", sort),
                ("limit", &limit),
                ("restrict_sr", "true"),
            ],
        )
        .await
    }
}

/// Split a comma separated subreddit list, dropping blanks
pub fn parse_subreddits(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Posts of one listing; stickied posts are skipped when `skip_stickied`
pub fn listing_posts(subreddit: &str, listing: &Value, skip_stickied: bool) -> Result<Vec<Value>> {
    let children = listing
        .pointer("/data/children")
        .and_then(Value::as_array)
        .ok_or_else(|| MarketError::parse(PROVIDER, "listing has no data.children"))?;

    Ok(children
        .iter()
        .filter_map(|child| child.get("data"))
        .filter(|post| !(skip_stickied && post.get("stickied").and_then(Value::as_bool).unwrap_or(false)))
        .map(|post| {
            let selftext = post.get("selftext").and_then(Value::as_str).unwrap_or_default();
            let permalink = post.get("permalink").and_then(Value::as_str).unwrap_or_default();
            json!({
                "subreddit": subreddit,
                "title": post.get("title").cloned().unwrap_or(Value::Null),
                "score": post.get("score").and_then(Value::as_i64).unwrap_or(0),
                "upvote_ratio": post.get("upvote_ratio").cloned().unwrap_or(Value::Null),
                "num_comments": post.get("num_comments").cloned().unwrap_or(Value::Null),
                "created_utc": post.get("created_utc").cloned().unwrap_or(Value::Null),
                "selftext": truncate(selftext, SELFTEXT_LIMIT),
                "url": format!("https://reddit.com{permalink}"),
            })
        })
        .collect())
}

/// Merge posts from several subreddits, highest score first
pub fn rank_posts(mut posts: Vec<Value>) -> Vec<Value> {
    let score = |p: &Value| p.get("score").and_then(Value::as_i64).unwrap_or(0);
    posts.sort_by_key(|p| std::cmp::Reverse(score(p)));
    posts
}
