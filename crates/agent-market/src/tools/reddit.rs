//! Reddit-backed capabilities: hot posts and search across subreddits

use super::{GET_REDDIT_HOT_POSTS, SEARCH_REDDIT_POSTS, bounded_arg, str_arg};
use crate::api::RedditClient;
use crate::api::reddit::{listing_posts, parse_subreddits, rank_posts};
use crate::cache::{CacheKey, ResponseCache};
use crate::error::MarketError;
use agent_tools::{Capability, CapabilityError, CapabilitySpec, ParamSpec, ParameterSchema};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

const DEFAULT_SUBREDDITS: &str = "wallstreetbets,stocks,investing";
const MAX_POSTS: u32 = 100;

fn subreddits_param() -> ParamSpec {
    ParamSpec::string("subreddits")
        .describe("Comma separated subreddit names")
        .default_value(DEFAULT_SUBREDDITS)
}

fn limit_param() -> ParamSpec {
    ParamSpec::integer("limit")
        .describe("Posts per subreddit")
        .default_value(20)
}

fn subreddits_arg(args: &Value) -> Result<Vec<String>, CapabilityError> {
    let subreddits = parse_subreddits(str_arg(args, "subreddits")?);
    if subreddits.is_empty() {
        return Err(CapabilityError::Validation(
            "parameter 'subreddits' must name at least one subreddit".into(),
        ));
    }
    Ok(subreddits)
}

/// Hot posts across investing subreddits
pub struct RedditHotPostsTool {
    spec: CapabilitySpec,
    client: Arc<RedditClient>,
    cache: ResponseCache,
}

impl RedditHotPostsTool {
    pub fn new(client: Arc<RedditClient>, cache: ResponseCache) -> Self {
        Self {
            spec: CapabilitySpec::new(
                GET_REDDIT_HOT_POSTS,
                "Get hot posts from investing subreddits, highest score first. \
                 Stickied posts are skipped.",
            )
            .parameters(
                ParameterSchema::new()
                    .param(subreddits_param())
                    .param(limit_param()),
            ),
            client,
            cache,
        }
    }
}

#[async_trait]
impl Capability for RedditHotPostsTool {
    fn spec(&self) -> &CapabilitySpec {
        &self.spec
    }

    async fn execute(&self, args: Value) -> Result<Value, CapabilityError> {
        let subreddits = subreddits_arg(&args)?;
        let limit = bounded_arg(&args, "limit", 1, MAX_POSTS)?;

        self.cache
            .get_or_fetch(CacheKey::new(GET_REDDIT_HOT_POSTS, &json!([subreddits, limit])), || async {
                let mut posts = Vec::new();
                for subreddit in &subreddits {
                    let listing = self.client.hot(subreddit, limit).await?;
                    posts.extend(listing_posts(subreddit, &listing, true)?);
                }
                let posts = rank_posts(posts);
                Ok::<_, MarketError>(json!({
                    "subreddits": subreddits,
                    "total_posts": posts.len(),
                    "posts": posts,
                }))
            })
            .await
            .map_err(CapabilityError::from)
    }
}

/// Keyword search across subreddits
pub struct RedditSearchTool {
    spec: CapabilitySpec,
    client: Arc<RedditClient>,
    cache: ResponseCache,
}

impl RedditSearchTool {
    pub fn new(client: Arc<RedditClient>, cache: ResponseCache) -> Self {
        Self {
            spec: CapabilitySpec::new(
                SEARCH_REDDIT_POSTS,
                "Search investing subreddits for posts about a ticker or topic, highest \
                 score first.",
            )
            .parameters(
                ParameterSchema::new()
                    .param(
                        ParamSpec::string("query")
                            .describe("Search keywords, e.g. \"AAPL earnings\"")
                            .required(),
                    )
                    .param(subreddits_param())
                    .param(
                        ParamSpec::string("sort")
                            .one_of(["relevance", "hot", "top", "new", "comments"])
                            .default_value("relevance"),
                    )
                    .param(limit_param()),
            ),
            client,
            cache,
        }
    }
}

#[async_trait]
impl Capability for RedditSearchTool {
    fn spec(&self) -> &CapabilitySpec {
        &self.spec
    }

    async fn execute(&self, args: Value) -> Result<Value, CapabilityError> {
        let query = str_arg(&args, "query")?.trim().to_string();
        if query.is_empty() {
            return Err(CapabilityError::Validation("parameter 'query' must not be empty".into()));
        }
        let subreddits = subreddits_arg(&args)?;
        let sort = str_arg(&args, "sort")?;
        let limit = bounded_arg(&args, "limit", 1, MAX_POSTS)?;

        self.cache
            .get_or_fetch(
                CacheKey::new(SEARCH_REDDIT_POSTS, &json!([query, subreddits, sort, limit])),
                || async {
                    let mut posts = Vec::new();
                    for subreddit in &subreddits {
                        let listing = self.client.search(subreddit, &query, sort, limit).await?;
                        posts.extend(listing_posts(subreddit, &listing, false)?);
                    }
                    let posts = rank_posts(posts);
                    Ok::<_, MarketError>(json!({
                        "query": query,
                        "subreddits": subreddits,
                        "total_posts": posts.len(),
                        "posts": posts,
                    }))
                },
            )
            .await
            .map_err(CapabilityError::from)
    }
}
