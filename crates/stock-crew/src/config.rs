//! Configuration for one crew run

use crate::assets::{DEFAULT_REFERENCE_ASSET, normalize_ticker};
use crate::error::{Result, StockError};
use crew_orchestrator::{DEFAULT_MAX_ITERATIONS, Process};
use crew_tools::RetryPolicy;
use crew_utils::config::{parsed, required};
use crew_utils::EnvSource;
use std::time::Duration;

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const OPENAI_API_BASE: &str = "OPENAI_API_BASE";
pub const MODEL: &str = "STOCK_CREW_MODEL";
pub const MANAGER_MODEL: &str = "STOCK_CREW_MANAGER_MODEL";
pub const PROCESS: &str = "STOCK_CREW_PROCESS";
pub const MAX_ITERATIONS: &str = "STOCK_CREW_MAX_ITERATIONS";
pub const REFERENCE_ASSET: &str = "STOCK_CREW_REFERENCE_ASSET";
pub const NEWS_RPM: &str = "STOCK_CREW_NEWS_RPM";
pub const TEMPERATURE: &str = "STOCK_CREW_TEMPERATURE";

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_NEWS_BASE_URL: &str = "https://duckduckgo.com";

/// Settings for a stock crew run
///
/// Built with [`StockCrewConfig::builder`] or read from the environment with
/// [`StockCrewConfig::from_env`]; CLI flags are applied on top.
#[derive(Clone)]
pub struct StockCrewConfig {
    /// Credential for the LLM service
    pub openai_api_key: Option<String>,

    /// OpenAI-compatible endpoint, when not the public API
    pub openai_api_base: Option<String>,

    /// Model used by the three analysts
    pub model: String,

    /// Model used by the hierarchical manager, defaults to `model`
    pub manager_model: Option<String>,

    /// Sampling temperature of the analysts; provider default when unset
    pub temperature: Option<f32>,

    pub process: Process,

    /// Ceiling on LLM calls across the whole run
    pub max_iterations: usize,

    /// Asset the news analyst always covers
    pub reference_asset: String,

    /// News search requests allowed per minute
    pub news_requests_per_minute: u32,

    pub news_base_url: String,

    pub market_cache_ttl: Duration,
    pub news_cache_ttl: Duration,

    /// Timeout for market data and news requests
    pub request_timeout: Duration,

    /// Timeout for LLM completions
    pub llm_timeout: Duration,

    /// Retries around market data and news requests
    pub retry: RetryPolicy,
}

impl Default for StockCrewConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_api_base: None,
            model: DEFAULT_MODEL.to_string(),
            manager_model: None,
            temperature: None,
            process: Process::Sequential,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            reference_asset: DEFAULT_REFERENCE_ASSET.to_string(),
            news_requests_per_minute: 20,
            news_base_url: DEFAULT_NEWS_BASE_URL.to_string(),
            market_cache_ttl: Duration::from_secs(3600),
            news_cache_ttl: Duration::from_secs(300),
            request_timeout: Duration::from_secs(30),
            llm_timeout: Duration::from_secs(120),
            retry: RetryPolicy::default(),
        }
    }
}

impl StockCrewConfig {
    pub fn builder() -> StockCrewConfigBuilder {
        StockCrewConfigBuilder::default()
    }

    /// Read settings from the environment
    ///
    /// `OPENAI_API_KEY` is required; a missing key fails here, before any
    /// client is created.
    pub fn from_env(env: &impl EnvSource) -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            openai_api_key: Some(required(env, OPENAI_API_KEY)?),
            openai_api_base: env.var(OPENAI_API_BASE),
            model: env.var(MODEL).unwrap_or(defaults.model),
            manager_model: env.var(MANAGER_MODEL),
            temperature: parsed(env, TEMPERATURE)?,
            process: env
                .var(PROCESS)
                .map(|raw| raw.parse::<Process>())
                .transpose()
                .map_err(|e| StockError::Config(e.to_string()))?
                .unwrap_or(defaults.process),
            max_iterations: parsed(env, MAX_ITERATIONS)?.unwrap_or(defaults.max_iterations),
            reference_asset: env
                .var(REFERENCE_ASSET)
                .unwrap_or(defaults.reference_asset),
            news_requests_per_minute: parsed(env, NEWS_RPM)?
                .unwrap_or(defaults.news_requests_per_minute),
            ..defaults
        };

        config.validate()?;
        Ok(config)
    }

    /// Check ranges and normalise the reference asset
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(StockError::Config("model must not be empty".to_string()));
        }
        if let Some(t) = self.temperature.filter(|t| !(0.0..=2.0).contains(t)) {
            return Err(StockError::Config(format!(
                "temperature must be between 0 and 2, got {t}"
            )));
        }
        if self.max_iterations == 0 {
            return Err(StockError::Config(
                "max_iterations must be greater than 0".to_string(),
            ));
        }
        if self.news_requests_per_minute == 0 {
            return Err(StockError::Config(
                "news requests per minute must be greater than 0".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(StockError::Config(
                "retry max_attempts must be greater than 0".to_string(),
            ));
        }
        normalize_ticker(&self.reference_asset).map_err(|_| {
            StockError::Config(format!(
                "invalid reference asset '{}'",
                self.reference_asset
            ))
        })?;
        Ok(())
    }

    /// Model the manager uses in hierarchical runs
    pub fn manager_model(&self) -> &str {
        self.manager_model.as_deref().unwrap_or(&self.model)
    }
}

impl std::fmt::Debug for StockCrewConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StockCrewConfig")
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "<redacted>"))
            .field("openai_api_base", &self.openai_api_base)
            .field("model", &self.model)
            .field("manager_model", &self.manager_model)
            .field("temperature", &self.temperature)
            .field("process", &self.process)
            .field("max_iterations", &self.max_iterations)
            .field("reference_asset", &self.reference_asset)
            .field("news_requests_per_minute", &self.news_requests_per_minute)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

/// Builder for StockCrewConfig
#[derive(Debug, Default)]
pub struct StockCrewConfigBuilder {
    openai_api_key: Option<String>,
    openai_api_base: Option<String>,
    model: Option<String>,
    manager_model: Option<String>,
    temperature: Option<f32>,
    process: Option<Process>,
    max_iterations: Option<usize>,
    reference_asset: Option<String>,
    news_requests_per_minute: Option<u32>,
    news_base_url: Option<String>,
    market_cache_ttl: Option<Duration>,
    news_cache_ttl: Option<Duration>,
    request_timeout: Option<Duration>,
    llm_timeout: Option<Duration>,
    retry: Option<RetryPolicy>,
}

impl StockCrewConfigBuilder {
    pub fn openai_api_key(mut self, key: impl Into<String>) -> Self {
        self.openai_api_key = Some(key.into());
        self
    }

    pub fn openai_api_base(mut self, base: impl Into<String>) -> Self {
        self.openai_api_base = Some(base.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn manager_model(mut self, model: impl Into<String>) -> Self {
        self.manager_model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn process(mut self, process: Process) -> Self {
        self.process = Some(process);
        self
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub fn reference_asset(mut self, asset: impl Into<String>) -> Self {
        self.reference_asset = Some(asset.into());
        self
    }

    pub fn news_requests_per_minute(mut self, rpm: u32) -> Self {
        self.news_requests_per_minute = Some(rpm);
        self
    }

    pub fn news_base_url(mut self, url: impl Into<String>) -> Self {
        self.news_base_url = Some(url.into());
        self
    }

    pub fn market_cache_ttl(mut self, ttl: Duration) -> Self {
        self.market_cache_ttl = Some(ttl);
        self
    }

    pub fn news_cache_ttl(mut self, ttl: Duration) -> Self {
        self.news_cache_ttl = Some(ttl);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn llm_timeout(mut self, timeout: Duration) -> Self {
        self.llm_timeout = Some(timeout);
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn build(self) -> Result<StockCrewConfig> {
        let defaults = StockCrewConfig::default();

        let config = StockCrewConfig {
            openai_api_key: self.openai_api_key,
            openai_api_base: self.openai_api_base,
            model: self.model.unwrap_or(defaults.model),
            manager_model: self.manager_model,
            temperature: self.temperature,
            process: self.process.unwrap_or(defaults.process),
            max_iterations: self.max_iterations.unwrap_or(defaults.max_iterations),
            reference_asset: self.reference_asset.unwrap_or(defaults.reference_asset),
            news_requests_per_minute: self
                .news_requests_per_minute
                .unwrap_or(defaults.news_requests_per_minute),
            news_base_url: self.news_base_url.unwrap_or(defaults.news_base_url),
            market_cache_ttl: self.market_cache_ttl.unwrap_or(defaults.market_cache_ttl),
            news_cache_ttl: self.news_cache_ttl.unwrap_or(defaults.news_cache_ttl),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            llm_timeout: self.llm_timeout.unwrap_or(defaults.llm_timeout),
            retry: self.retry.unwrap_or(defaults.retry),
        };

        config.validate()?;
        Ok(config)
    }
}
