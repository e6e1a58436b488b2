//! The stock crew: price trend, news sentiment, newsletter
//!
//! ```text
//! price ─┐
//!        ├─> write
//! news  ─┘
//! ```
//!
//! [`StockCrew`] owns the long-lived clients and caches. Each kickoff
//! assembles fresh agents and tasks for one ticker and run date, so the
//! market window and the template inputs always match the run.

use crate::agents::{AgentLlm, news_analyst, price_analyst, writer};
use crate::analysis::{PriceTrendGuard, ReportGuard, SentimentGuard};
use crate::api::{DuckDuckGoNews, MarketData, NewsResult, NewsSearch, PriceSeries, YahooMarketData};
use crate::assets::{asset_set, normalize_ticker};
use crate::cache::StockCache;
use crate::config::{OPENAI_API_KEY, StockCrewConfig};
use crate::prompts::{self, stock_prompts};
use crate::tools::{MarketDataTool, NewsSearchTool};
use chrono::{NaiveDate, Utc};
use crew_core::{Context, Error, Result};
use crew_llm::LLMProvider;
use crew_llm::providers::{OpenAIConfig, OpenAIProvider};
use crew_orchestrator::{Crew, CrewOutput, Process, Task};
use crew_prompt::PromptRegistry;
use crew_tools::Tool;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};

pub const PRICE_TASK_ID: &str = "price";
pub const NEWS_TASK_ID: &str = "news";
pub const WRITE_TASK_ID: &str = "write";

/// Runs the three-agent stock analysis
pub struct StockCrew {
    config: StockCrewConfig,
    llm: Arc<dyn LLMProvider>,
    manager_llm: Arc<dyn LLMProvider>,
    market: Arc<dyn MarketData>,
    news: Arc<dyn NewsSearch>,
    market_cache: StockCache<PriceSeries>,
    news_cache: StockCache<NewsResult>,
    prompts: PromptRegistry,
}

impl StockCrew {
    pub fn builder(config: StockCrewConfig) -> StockCrewBuilder {
        StockCrewBuilder::new(config)
    }

    /// OpenAI, Yahoo Finance and DuckDuckGo clients from `config`
    pub fn from_config(config: StockCrewConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn config(&self) -> &StockCrewConfig {
        &self.config
    }

    /// Analyse `ticker` as of today
    pub async fn kickoff(&self, ticker: &str) -> Result<CrewOutput> {
        self.kickoff_on(ticker, Utc::now().date_naive()).await
    }

    /// Analyse `ticker` with `run_date` as the current date
    ///
    /// An invalid ticker or reference asset is a configuration error raised
    /// before any LLM or provider call.
    #[instrument(skip(self), fields(process = %self.config.process))]
    pub async fn kickoff_on(&self, ticker: &str, run_date: NaiveDate) -> Result<CrewOutput> {
        let ticker = normalize_ticker(ticker)?;
        let reference = normalize_ticker(&self.config.reference_asset)?;
        let assets = asset_set(&ticker, &reference);

        let crew = self.assemble(&ticker, &assets, run_date)?;
        let inputs = Context::new()
            .with_ticker(&ticker)
            .with_current_date(run_date.to_string())
            .with_input("assets", json!(assets))
            .with_input("reference_asset", json!(reference));

        info!(ticker = %ticker, assets = ?assets, run_date = %run_date, "Stock crew kickoff");
        crew.kickoff(inputs).await
    }

    fn assemble(&self, ticker: &str, assets: &[String], run_date: NaiveDate) -> Result<Crew> {
        let mut llm = AgentLlm::new(Arc::clone(&self.llm), &self.config.model);
        if let Some(temperature) = self.config.temperature {
            llm = llm.with_temperature(temperature);
        }

        let market_tool: Arc<dyn Tool> = Arc::new(MarketDataTool::new(
            Arc::clone(&self.market),
            self.market_cache.clone(),
            self.config.retry.clone(),
            run_date,
        ));
        let news_tool: Arc<dyn Tool> = Arc::new(NewsSearchTool::new(
            Arc::clone(&self.news),
            self.news_cache.clone(),
            self.config.retry.clone(),
        ));

        let price_agent = Arc::new(price_analyst(&self.prompts, &llm, market_tool)?);
        let news_agent = Arc::new(news_analyst(&self.prompts, &llm, news_tool)?);
        let writer_agent = Arc::new(writer(&self.prompts, &llm)?);

        let price = Task::builder(PRICE_TASK_ID)
            .description(prompts::source(&self.prompts, prompts::PRICE_TASK)?)
            .expected_output(prompts::source(&self.prompts, prompts::PRICE_TASK_OUTPUT)?)
            .agent(price_agent)
            .guard(Arc::new(PriceTrendGuard::new(ticker)))
            .build()?;

        let news = Task::builder(NEWS_TASK_ID)
            .description(prompts::source(&self.prompts, prompts::NEWS_TASK)?)
            .expected_output(prompts::source(&self.prompts, prompts::NEWS_TASK_OUTPUT)?)
            .agent(news_agent)
            .guard(Arc::new(SentimentGuard::new(assets.to_vec())))
            .build()?;

        let write = Task::builder(WRITE_TASK_ID)
            .description(prompts::source(&self.prompts, prompts::WRITE_TASK)?)
            .expected_output(prompts::source(&self.prompts, prompts::WRITE_TASK_OUTPUT)?)
            .agent(writer_agent)
            .context(PRICE_TASK_ID)
            .context(NEWS_TASK_ID)
            .guard(Arc::new(ReportGuard))
            .build()?;

        let mut builder = Crew::builder()
            .task(price)
            .task(news)
            .task(write)
            .process(self.config.process)
            .max_iterations(self.config.max_iterations);
        if self.config.process == Process::Hierarchical {
            builder = builder.manager_llm(
                Arc::clone(&self.manager_llm),
                self.config.manager_model(),
            );
        }
        builder.build()
    }
}

impl std::fmt::Debug for StockCrew {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StockCrew")
            .field("config", &self.config)
            .field("llm", &self.llm.name())
            .finish_non_exhaustive()
    }
}

/// Parsed form of a completed task, as accepted by its guard
pub fn structured<T: DeserializeOwned>(output: &CrewOutput, task: &str) -> Option<T> {
    let value = output.task(task)?.output.as_ref()?.structured.clone()?;
    serde_json::from_value(value).ok()
}

/// Builder for [`StockCrew`]
///
/// Anything not injected is created from the config: OpenAI for the LLM,
/// Yahoo Finance for prices and DuckDuckGo for news.
pub struct StockCrewBuilder {
    config: StockCrewConfig,
    llm: Option<Arc<dyn LLMProvider>>,
    manager_llm: Option<Arc<dyn LLMProvider>>,
    market: Option<Arc<dyn MarketData>>,
    news: Option<Arc<dyn NewsSearch>>,
}

impl StockCrewBuilder {
    pub fn new(config: StockCrewConfig) -> Self {
        Self {
            config,
            llm: None,
            manager_llm: None,
            market: None,
            news: None,
        }
    }

    pub fn llm(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.llm = Some(provider);
        self
    }

    /// Provider of the hierarchical manager; defaults to the agents' LLM
    pub fn manager_llm(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.manager_llm = Some(provider);
        self
    }

    pub fn market_data(mut self, market: Arc<dyn MarketData>) -> Self {
        self.market = Some(market);
        self
    }

    pub fn news_search(mut self, news: Arc<dyn NewsSearch>) -> Self {
        self.news = Some(news);
        self
    }

    pub fn build(self) -> Result<StockCrew> {
        let config = self.config;
        config.validate()?;

        // Credentials first: a missing key must fail before any client exists
        let llm = match self.llm {
            Some(llm) => llm,
            None => openai_provider(&config)?,
        };
        let manager_llm = self.manager_llm.unwrap_or_else(|| Arc::clone(&llm));

        let market = match self.market {
            Some(market) => market,
            None => Arc::new(YahooMarketData::new(config.request_timeout)),
        };
        let news = match self.news {
            Some(news) => news,
            None => Arc::new(DuckDuckGoNews::new(
                &config.news_base_url,
                config.news_requests_per_minute,
                config.request_timeout,
            )?),
        };

        Ok(StockCrew {
            market_cache: StockCache::new("market_data", config.market_cache_ttl),
            news_cache: StockCache::new("news_search", config.news_cache_ttl),
            prompts: stock_prompts()?,
            config,
            llm,
            manager_llm,
            market,
            news,
        })
    }
}

fn openai_provider(config: &StockCrewConfig) -> Result<Arc<dyn LLMProvider>> {
    let key = config
        .openai_api_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| Error::Config(format!("{OPENAI_API_KEY} is not set")))?;

    let mut openai = OpenAIConfig::new(key).with_timeout(config.llm_timeout.as_secs());
    if let Some(base) = &config.openai_api_base {
        openai = openai.with_api_base(base);
    }
    Ok(Arc::new(OpenAIProvider::with_config(openai)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Report, SentimentReport, Trend};
    use crate::api::market::fixtures::trending_series;
    use crate::api::news::fixtures::items;
    use crate::api::{MockMarketData, MockNewsSearch};
    use crate::error::StockError;
    use crate::tools::{MARKET_DATA, NEWS_SEARCH};
    use crew_llm::testing::{ScriptedProvider, reply};
    use crew_orchestrator::{RunStatus, TaskState};
    use crew_tools::RetryPolicy;

    const PRICE_ANSWER: &str = "AAPL, price up\nThe stock climbed steadily over the last 52 weeks.";

    const NEWS_ANSWER: &str = "Markets are in a risk-on mood.\n\n\
        AAPL\nApple rallied after strong iPhone sales.\nup\n72\n\n\
        BTC\nBitcoin cooled on ETF outflows.\nsideways\n48";

    const REPORT: &str = "\
# AAPL Newsletter

## Executive Summary
- AAPL is in a clear uptrend over the past year.
- News sentiment on Apple is greedy at 72.
- Bitcoin sentiment is neutral at 48.

## Introduction
Apple keeps beating expectations.

## Main Analysis
Price momentum and strong product news support the stock, while crypto markets pause.

## Summary
We predict the trend stays up in the coming weeks.
";

    fn run_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    fn config() -> StockCrewConfig {
        StockCrewConfig::builder()
            .retry(RetryPolicy::fast())
            .build()
            .unwrap()
    }

    fn market() -> MockMarketData {
        let mut market = MockMarketData::new();
        market
            .expect_daily_history()
            .returning(|ticker, range| Ok(trending_series(ticker, range, 150.0, 0.2)));
        market
    }

    fn news() -> MockNewsSearch {
        let mut news = MockNewsSearch::new();
        news.expect_search_news()
            .returning(|query, _| Ok(NewsResult::new(query, items(query, 10))));
        news
    }

    fn crew(
        config: StockCrewConfig,
        llm: Arc<ScriptedProvider>,
        market: MockMarketData,
        news: MockNewsSearch,
    ) -> StockCrew {
        StockCrew::builder(config)
            .llm(llm)
            .market_data(Arc::new(market))
            .news_search(Arc::new(news))
            .build()
            .unwrap()
    }

    fn happy_script() -> Vec<crew_llm::CompletionResponse> {
        vec![
            reply::tool_call("p1", MARKET_DATA, json!({ "ticker": "AAPL" })),
            reply::text(PRICE_ANSWER),
            reply::tool_calls(&[
                ("n1", NEWS_SEARCH, json!({ "query": "AAPL stock news" })),
                ("n2", NEWS_SEARCH, json!({ "query": "BTC bitcoin news" })),
            ]),
            reply::text(NEWS_ANSWER),
            reply::text(REPORT),
        ]
    }

    #[tokio::test]
    async fn test_full_run_produces_newsletter() {
        let llm = Arc::new(ScriptedProvider::new(happy_script()));
        let crew = crew(config(), Arc::clone(&llm), market(), news());

        let output = tokio_test::assert_ok!(crew.kickoff_on("aapl", run_date()).await);

        assert_eq!(output.status, RunStatus::Completed);
        assert_eq!(output.ticker.as_deref(), Some("AAPL"));
        assert_eq!(output.run_date.as_deref(), Some("2025-06-02"));
        assert_eq!(output.iterations_used, 5);
        assert!(output.tasks.iter().all(|t| t.state == TaskState::Complete));

        let price = output.task(PRICE_TASK_ID).unwrap();
        assert!(price.output.as_ref().unwrap().raw.contains("AAPL, price up"));
        assert_eq!(price.iterations, 2);

        let sentiment: SentimentReport = structured(&output, NEWS_TASK_ID).unwrap();
        assert_eq!(sentiment.assets.len(), 2);
        assert_eq!(sentiment.asset("AAPL").unwrap().score.value(), 72);
        assert_eq!(sentiment.asset("BTC").unwrap().trend, Trend::Sideways);

        let report: Report = structured(&output, WRITE_TASK_ID).unwrap();
        assert_eq!(report.executive_summary.len(), 3);
        assert_eq!(report.prediction, Trend::Up);
        assert!(output.final_text().unwrap().contains("## Executive Summary"));

        let requests = llm.requests();
        let writer_prompt = requests[4].messages[0].text().unwrap();
        assert!(writer_prompt.contains("This is the context you're working with"));
        assert!(writer_prompt.contains("AAPL, price up"));
        assert!(writer_prompt.contains("Bitcoin cooled on ETF outflows."));

        let news_prompt = requests[2].messages[0].text().unwrap();
        assert!(news_prompt.contains("always include BTC"));
        assert!(news_prompt.contains("The current date is 2025-06-02."));
    }

    #[tokio::test]
    async fn test_configured_temperature_reaches_every_request() {
        let config = StockCrewConfig::builder()
            .retry(RetryPolicy::fast())
            .temperature(0.2)
            .build()
            .unwrap();
        let llm = Arc::new(ScriptedProvider::new(happy_script()));
        let crew = crew(config, Arc::clone(&llm), market(), news());

        let output = crew.kickoff_on("AAPL", run_date()).await.unwrap();

        assert!(output.is_complete());
        assert!(llm.requests().iter().all(|r| r.temperature == Some(0.2)));
    }

    #[tokio::test]
    async fn test_unknown_ticker_fails_and_blocks_writer() {
        let llm = Arc::new(ScriptedProvider::new(vec![
            reply::tool_call("p1", MARKET_DATA, json!({ "ticker": "ZZZZZZ" })),
            reply::text("I could not find any price data for ZZZZZZ."),
        ]));
        let mut market = MockMarketData::new();
        market
            .expect_daily_history()
            .times(1)
            .returning(|ticker, _| Err(StockError::no_data(ticker, "symbol not found")));
        let mut news = MockNewsSearch::new();
        news.expect_search_news().never();

        let crew = crew(config(), Arc::clone(&llm), market, news);
        let output = crew.kickoff_on("ZZZZZZ", run_date()).await.unwrap();

        assert!(matches!(output.status, RunStatus::Failed(_)));
        assert!(output.final_output.is_none());

        let price = output.task(PRICE_TASK_ID).unwrap();
        assert_eq!(price.state, TaskState::Failed);
        assert!(price.error.as_ref().unwrap().contains("Tool 'market_data' failed"));

        let write = output.task(WRITE_TASK_ID).unwrap();
        assert!(write.blocked);
        assert_eq!(write.state, TaskState::Pending);
        assert_eq!(llm.call_count(), 2);
    }

    #[test]
    fn test_missing_credential_is_config_error() {
        let mut market = MockMarketData::new();
        market.expect_daily_history().never();
        let mut news = MockNewsSearch::new();
        news.expect_search_news().never();

        let result = StockCrew::builder(config())
            .market_data(Arc::new(market))
            .news_search(Arc::new(news))
            .build();
        assert!(matches!(result, Err(Error::Config(ref m)) if m.contains(OPENAI_API_KEY)));
    }

    #[tokio::test]
    async fn test_budget_ceiling_returns_partial_output() {
        let config = StockCrewConfig::builder()
            .retry(RetryPolicy::fast())
            .max_iterations(3)
            .build()
            .unwrap();
        let llm = Arc::new(ScriptedProvider::new(happy_script()));
        let crew = crew(config, Arc::clone(&llm), market(), news());

        let output = crew.kickoff_on("AAPL", run_date()).await.unwrap();

        assert_eq!(output.status, RunStatus::BudgetExceeded);
        assert_eq!(output.iterations_used, 3);
        assert_eq!(llm.call_count(), 3);
        assert!(output.final_output.is_none());

        let price = output.task(PRICE_TASK_ID).unwrap();
        assert_eq!(price.state, TaskState::Complete);
        assert!(price.output.is_some());
        assert_eq!(output.task(NEWS_TASK_ID).unwrap().state, TaskState::Failed);
        assert!(output.task(WRITE_TASK_ID).unwrap().blocked);
    }

    #[tokio::test]
    async fn test_hierarchical_manager_picks_news_first() {
        let config = StockCrewConfig::builder()
            .retry(RetryPolicy::fast())
            .process(Process::Hierarchical)
            .manager_model("gpt-4o")
            .build()
            .unwrap();
        let manager = Arc::new(ScriptedProvider::new(vec![reply::text("news")]));
        let script = happy_script();
        let llm = Arc::new(ScriptedProvider::new(vec![
            script[2].clone(),
            script[3].clone(),
            script[0].clone(),
            script[1].clone(),
            script[4].clone(),
        ]));

        let crew = StockCrew::builder(config)
            .llm(Arc::clone(&llm) as Arc<dyn LLMProvider>)
            .manager_llm(Arc::clone(&manager) as Arc<dyn LLMProvider>)
            .market_data(Arc::new(market()))
            .news_search(Arc::new(news()))
            .build()
            .unwrap();

        let output = crew.kickoff_on("AAPL", run_date()).await.unwrap();

        assert!(output.is_complete());
        assert_eq!(output.process, Process::Hierarchical);
        assert_eq!(manager.call_count(), 1);
        assert_eq!(manager.requests()[0].model, "gpt-4o");
        assert_eq!(output.iterations_used, 6);
        assert_eq!(output.task(NEWS_TASK_ID).unwrap().iterations, 2);
    }

    #[tokio::test]
    async fn test_invalid_ticker_rejected_before_any_call() {
        let llm = Arc::new(ScriptedProvider::new(Vec::new()));
        let mut market = MockMarketData::new();
        market.expect_daily_history().never();
        let mut news = MockNewsSearch::new();
        news.expect_search_news().never();

        let crew = crew(config(), Arc::clone(&llm), market, news);
        let err = crew.kickoff_on("not a ticker!", run_date()).await.unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert_eq!(llm.call_count(), 0);
    }
}
