//! Configuration for the market intelligence pipeline
//!
//! Every value has a default; [`MarketConfig::from_env`] overlays the
//! environment. Only `FINNHUB_API_KEY` is required. Missing optional
//! credentials remove the capabilities that need them.

use crate::error::{MarketError, Result};
use agent_llm::providers::OpenAIConfig;
use agent_utils::{Secret, env_or, env_secret, env_var};
use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_REGION: &str = "us-central1";
pub const DEFAULT_REDDIT_USER_AGENT: &str = "market-intelligence-agent/1.0";

/// Requests per minute allowed for each provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimits {
    pub finnhub: u32,
    pub fred: u32,
    pub reddit: u32,
    pub marketaux: u32,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            finnhub: 60,
            fred: 120,
            reddit: 100,
            marketaux: 100,
        }
    }
}

/// Provider base URLs; overridable for self-hosted proxies and tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub finnhub: String,
    pub marketaux: String,
    pub fred: String,
    /// Authenticated Reddit API host
    pub reddit_api: String,
    /// Host issuing Reddit OAuth tokens
    pub reddit_auth: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            finnhub: "https://finnhub.io/api/v1".to_string(),
            marketaux: "https://api.marketaux.com/v1".to_string(),
            fred: "https://api.stlouisfed.org/fred".to_string(),
            reddit_api: "https://oauth.reddit.com".to_string(),
            reddit_auth: "https://www.reddit.com".to_string(),
        }
    }
}

/// Configuration for market data access and the agents
#[derive(Debug, Clone)]
pub struct MarketConfig {
    pub finnhub_api_key: Option<Secret>,
    pub marketaux_api_key: Option<Secret>,
    pub fred_api_key: Option<Secret>,
    pub reddit_client_id: Option<Secret>,
    pub reddit_client_secret: Option<Secret>,
    pub reddit_user_agent: String,

    /// Google Cloud project hosting the model endpoint
    pub project_id: Option<String>,
    pub region: String,
    /// OpenAI-compatible base URL; takes precedence over the Vertex AI project
    pub llm_api_base: Option<String>,
    /// Bearer credential for the model endpoint (an access token for Vertex AI)
    pub llm_api_key: Option<Secret>,
    /// Model reference handed to every agent
    pub model: String,

    /// Deadline for a single capability call
    pub call_timeout: Duration,
    pub rate_limits: RateLimits,

    /// Cache TTL for real-time data (quotes, sentiment)
    pub cache_ttl_realtime: Duration,
    /// Cache TTL for slow-moving data (profiles, financials, economic series)
    pub cache_ttl_reference: Duration,
    /// Cache TTL for news and social posts
    pub cache_ttl_news: Duration,

    pub endpoints: Endpoints,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            finnhub_api_key: None,
            marketaux_api_key: None,
            fred_api_key: None,
            reddit_client_id: None,
            reddit_client_secret: None,
            reddit_user_agent: DEFAULT_REDDIT_USER_AGENT.to_string(),
            project_id: None,
            region: DEFAULT_REGION.to_string(),
            llm_api_base: None,
            llm_api_key: None,
            model: DEFAULT_MODEL.to_string(),
            call_timeout: Duration::from_secs(10),
            rate_limits: RateLimits::default(),
            cache_ttl_realtime: Duration::from_secs(60),
            cache_ttl_reference: Duration::from_secs(3600),
            cache_ttl_news: Duration::from_secs(300),
            endpoints: Endpoints::default(),
        }
    }
}

/// One credential the pipeline can use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Credential {
    pub env: &'static str,
    pub purpose: &'static str,
}

const REQUIRED: &[Credential] = &[Credential {
    env: "FINNHUB_API_KEY",
    purpose: "Finnhub (quotes, company data, news)",
}];

const OPTIONAL: &[Credential] = &[
    Credential {
        env: "MARKETAUX_API_KEY",
        purpose: "Marketaux (news with sentiment)",
    },
    Credential {
        env: "FRED_API_KEY",
        purpose: "FRED (economic indicators)",
    },
    Credential {
        env: "REDDIT_CLIENT_ID",
        purpose: "Reddit (social sentiment)",
    },
    Credential {
        env: "REDDIT_CLIENT_SECRET",
        purpose: "Reddit (social sentiment)",
    },
];

/// Which credentials are missing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CredentialReport {
    pub missing_required: Vec<Credential>,
    pub missing_optional: Vec<Credential>,
}

impl CredentialReport {
    /// True when the pipeline can start
    pub fn is_ready(&self) -> bool {
        self.missing_required.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_required.is_empty() && self.missing_optional.is_empty()
    }
}

impl MarketConfig {
    /// Create a new configuration builder
    pub fn builder() -> MarketConfigBuilder {
        MarketConfigBuilder::default()
    }

    /// Defaults overlaid with the environment
    ///
    /// Does not validate, so a missing required key can still be reported
    /// through [`credential_report`](Self::credential_report).
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let mut endpoints = defaults.endpoints.clone();
        if let Some(url) = env_var("FINNHUB_BASE_URL") {
            endpoints.finnhub = url;
        }
        if let Some(url) = env_var("MARKETAUX_BASE_URL") {
            endpoints.marketaux = url;
        }
        if let Some(url) = env_var("FRED_BASE_URL") {
            endpoints.fred = url;
        }
        if let Some(url) = env_var("REDDIT_API_BASE_URL") {
            endpoints.reddit_api = url;
        }
        if let Some(url) = env_var("REDDIT_AUTH_URL") {
            endpoints.reddit_auth = url;
        }

        let call_timeout = match env_var("CAPABILITY_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.parse().map_err(|_| {
                MarketError::Config(format!("CAPABILITY_TIMEOUT_SECS must be a number of seconds, got '{raw}'"))
            })?),
            None => defaults.call_timeout,
        };

        Ok(Self {
            finnhub_api_key: env_secret("FINNHUB_API_KEY"),
            marketaux_api_key: env_secret("MARKETAUX_API_KEY"),
            fred_api_key: env_secret("FRED_API_KEY"),
            reddit_client_id: env_secret("REDDIT_CLIENT_ID"),
            reddit_client_secret: env_secret("REDDIT_CLIENT_SECRET"),
            reddit_user_agent: env_or("REDDIT_USER_AGENT", DEFAULT_REDDIT_USER_AGENT),
            project_id: env_var("PROJECT_ID"),
            region: env_or("REGION", DEFAULT_REGION),
            llm_api_base: env_var("LLM_API_BASE"),
            llm_api_key: env_secret("LLM_API_KEY"),
            model: env_or("MODEL_ID", DEFAULT_MODEL),
            call_timeout,
            endpoints,
            ..defaults
        })
    }

    /// Model endpoint the agents talk to
    ///
    /// `llm_api_base` selects any OpenAI-compatible endpoint; otherwise
    /// `project_id` and `region` select Vertex AI.
    pub fn model_endpoint(&self) -> Result<OpenAIConfig> {
        let key = self
            .llm_api_key
            .clone()
            .ok_or(MarketError::MissingCredential("LLM_API_KEY"))?;
        if let Some(base) = &self.llm_api_base {
            return Ok(OpenAIConfig::new(key).with_api_base(base.clone()));
        }
        match &self.project_id {
            Some(project) => Ok(OpenAIConfig::vertex(project, &self.region, key)),
            None => Err(MarketError::Config(
                "set LLM_API_BASE, or PROJECT_ID for Vertex AI".to_string(),
            )),
        }
    }

    /// Credentials that are not configured, split by requirement
    pub fn credential_report(&self) -> CredentialReport {
        let is_set = |env: &str| match env {
            "FINNHUB_API_KEY" => self.finnhub_api_key.is_some(),
            "MARKETAUX_API_KEY" => self.marketaux_api_key.is_some(),
            "FRED_API_KEY" => self.fred_api_key.is_some(),
            "REDDIT_CLIENT_ID" => self.reddit_client_id.is_some(),
            "REDDIT_CLIENT_SECRET" => self.reddit_client_secret.is_some(),
            _ => false,
        };

        CredentialReport {
            missing_required: REQUIRED.iter().filter(|c| !is_set(c.env)).copied().collect(),
            missing_optional: OPTIONAL.iter().filter(|c| !is_set(c.env)).copied().collect(),
        }
    }

    /// Reddit needs both halves of the client credentials
    pub fn reddit_credentials(&self) -> Option<(&Secret, &Secret)> {
        self.reddit_client_id.as_ref().zip(self.reddit_client_secret.as_ref())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.finnhub_api_key.is_none() {
            return Err(MarketError::MissingCredential("FINNHUB_API_KEY"));
        }

        if self.call_timeout.is_zero() {
            return Err(MarketError::Config(
                "call_timeout must be greater than 0".to_string(),
            ));
        }

        let limits = self.rate_limits;
        if [limits.finnhub, limits.fred, limits.reddit, limits.marketaux].contains(&0) {
            return Err(MarketError::Config(
                "rate limits must be greater than 0".to_string(),
            ));
        }

        if self.model.trim().is_empty() {
            return Err(MarketError::Config("model must not be empty".to_string()));
        }

        Ok(())
    }
}

/// Builder for MarketConfig
#[derive(Debug, Default)]
pub struct MarketConfigBuilder {
    config: MarketConfig,
}

impl MarketConfigBuilder {
    pub fn finnhub_api_key(mut self, key: impl Into<Secret>) -> Self {
        self.config.finnhub_api_key = Some(key.into());
        self
    }

    pub fn marketaux_api_key(mut self, key: impl Into<Secret>) -> Self {
        self.config.marketaux_api_key = Some(key.into());
        self
    }

    pub fn fred_api_key(mut self, key: impl Into<Secret>) -> Self {
        self.config.fred_api_key = Some(key.into());
        self
    }

    /// Set Reddit client id and secret
    pub fn reddit_credentials(mut self, id: impl Into<Secret>, secret: impl Into<Secret>) -> Self {
        self.config.reddit_client_id = Some(id.into());
        self.config.reddit_client_secret = Some(secret.into());
        self
    }

    pub fn reddit_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.reddit_user_agent = agent.into();
        self
    }

    pub fn project_id(mut self, project: impl Into<String>) -> Self {
        self.config.project_id = Some(project.into());
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.config.region = region.into();
        self
    }

    /// OpenAI-compatible endpoint used instead of Vertex AI
    pub fn llm_api_base(mut self, url: impl Into<String>) -> Self {
        self.config.llm_api_base = Some(url.into());
        self
    }

    pub fn llm_api_key(mut self, key: impl Into<Secret>) -> Self {
        self.config.llm_api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the per-call deadline
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.config.call_timeout = timeout;
        self
    }

    pub fn rate_limits(mut self, limits: RateLimits) -> Self {
        self.config.rate_limits = limits;
        self
    }

    /// Set cache TTLs for real-time, reference and news data
    pub fn cache_ttls(mut self, realtime: Duration, reference: Duration, news: Duration) -> Self {
        self.config.cache_ttl_realtime = realtime;
        self.config.cache_ttl_reference = reference;
        self.config.cache_ttl_news = news;
        self
    }

    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.config.endpoints = endpoints;
        self
    }

    /// Point every provider at one base URL (a mock server in tests)
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.config.endpoints = Endpoints {
            finnhub: url.clone(),
            marketaux: url.clone(),
            fred: url.clone(),
            reddit_api: url.clone(),
            reddit_auth: url,
        };
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<MarketConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MarketConfig::default();
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.region, "us-central1");
        assert_eq!(config.call_timeout, Duration::from_secs(10));
        assert_eq!(config.rate_limits.fred, 120);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_model_endpoint_uses_configured_project() {
        let config = MarketConfig::builder()
            .finnhub_api_key("fh")
            .project_id("proj-1")
            .region("europe-west4")
            .llm_api_key("ya29.token")
            .build()
            .unwrap();

        let endpoint = config.model_endpoint().unwrap();
        assert_eq!(
            endpoint.api_base,
            "https://europe-west4-aiplatform.googleapis.com/v1/projects/proj-1/locations/europe-west4/endpoints/openapi"
        );
        assert_eq!(endpoint.api_key.expose(), "ya29.token");
        assert_eq!(endpoint.provider_name, "vertex");
    }

    #[test]
    fn test_model_endpoint_prefers_api_base() {
        let config = MarketConfig::builder()
            .finnhub_api_key("fh")
            .project_id("proj-1")
            .llm_api_base("http://localhost:1234/v1/")
            .llm_api_key("k")
            .build()
            .unwrap();
        assert_eq!(config.model_endpoint().unwrap().api_base, "http://localhost:1234/v1");

        let no_target = MarketConfig::builder()
            .finnhub_api_key("fh")
            .llm_api_key("k")
            .build()
            .unwrap();
        assert!(matches!(no_target.model_endpoint(), Err(MarketError::Config(_))));

        let no_key = MarketConfig::builder().finnhub_api_key("fh").build().unwrap();
        assert!(matches!(
            no_key.model_endpoint(),
            Err(MarketError::MissingCredential("LLM_API_KEY"))
        ));
    }

    #[test]
    fn test_config_builder() {
        let config = MarketConfig::builder()
            .finnhub_api_key("fh")
            .model("gemini-2.5-pro")
            .call_timeout(Duration::from_secs(5))
            .build()
            .unwrap();

        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.call_timeout, Duration::from_secs(5));
        assert_eq!(config.finnhub_api_key.unwrap().expose(), "fh");
    }

    #[test]
    fn test_validation_requires_finnhub() {
        let err = MarketConfig::builder().build().unwrap_err();
        assert!(matches!(err, MarketError::MissingCredential("FINNHUB_API_KEY")));
    }

    #[test]
    fn test_validation_rejects_zero_limits() {
        let err = MarketConfig::builder()
            .finnhub_api_key("fh")
            .rate_limits(RateLimits {
                reddit: 0,
                ..RateLimits::default()
            })
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("rate limits"));
    }

    #[test]
    fn test_credential_report() {
        let config = MarketConfig {
            fred_api_key: Some(Secret::new("fred")),
            reddit_client_id: Some(Secret::new("id")),
            ..Default::default()
        };
        let report = config.credential_report();

        assert!(!report.is_ready());
        assert_eq!(report.missing_required[0].env, "FINNHUB_API_KEY");
        let optional: Vec<&str> = report.missing_optional.iter().map(|c| c.env).collect();
        assert_eq!(optional, vec!["MARKETAUX_API_KEY", "REDDIT_CLIENT_SECRET"]);
        assert!(config.reddit_credentials().is_none());
    }

    #[test]
    fn test_base_url_override() {
        let config = MarketConfig::builder()
            .finnhub_api_key("fh")
            .base_url("http://127.0.0.1:9999")
            .build()
            .unwrap();
        assert_eq!(config.endpoints.fred, "http://127.0.0.1:9999");
        assert_eq!(config.endpoints.reddit_auth, "http://127.0.0.1:9999");
    }
}
