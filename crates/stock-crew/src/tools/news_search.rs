//! News search for one query

use super::NEWS_SEARCH;
use crate::api::{MAX_NEWS_RESULTS, NewsResult, NewsSearch};
use crate::cache::StockCache;
use crate::error::Result;
use async_trait::async_trait;
use crew_llm::tools::schema;
use crew_tools::{RetryPolicy, Tool, parse_params};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Debug, Deserialize)]
struct NewsSearchParams {
    query: String,
    #[serde(default)]
    limit: Option<usize>,
}

/// Searches recent news, at most ten results per query
pub struct NewsSearchTool {
    provider: Arc<dyn NewsSearch>,
    cache: StockCache<NewsResult>,
    retry: RetryPolicy,
}

impl NewsSearchTool {
    pub fn new(provider: Arc<dyn NewsSearch>, cache: StockCache<NewsResult>, retry: RetryPolicy) -> Self {
        Self {
            provider,
            cache,
            retry,
        }
    }

    #[instrument(skip(self), fields(tool = NEWS_SEARCH))]
    async fn search(&self, query: &str, limit: Option<usize>) -> Result<Value> {
        let limit = limit.unwrap_or(MAX_NEWS_RESULTS).clamp(1, MAX_NEWS_RESULTS);

        // Cached at full size so a smaller limit later is still a hit
        let key = query.to_lowercase();
        let result = self
            .cache
            .get_or_fetch(&key, || {
                self.retry.execute("search_news", || {
                    self.provider.search_news(query, MAX_NEWS_RESULTS)
                })
            })
            .await?
            .truncated(limit);

        info!(query, results = result.len(), "News search ready");
        Ok(json!({
            "query": result.query(),
            "count": result.len(),
            "results": result.items(),
        }))
    }
}

#[async_trait]
impl Tool for NewsSearchTool {
    async fn execute(&self, params: Value) -> crew_core::Result<Value> {
        let params: NewsSearchParams = parse_params(NEWS_SEARCH, params)?;
        let query = params.query.split_whitespace().collect::<Vec<_>>().join(" ");
        if query.is_empty() {
            return Err(crew_core::Error::tool(NEWS_SEARCH, "query must not be empty"));
        }

        self.search(&query, params.limit)
            .await
            .map_err(|e| e.into_tool_error(NEWS_SEARCH))
    }

    fn name(&self) -> &str {
        NEWS_SEARCH
    }

    fn description(&self) -> &str {
        "Search recent news articles. Search one asset per call, e.g. 'AAPL stock news' \
         or 'BTC bitcoin news'. Returns up to 10 results with title, snippet and source."
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "query": schema::string("What to search the news for"),
                "limit": schema::integer_range("Maximum number of results", 1, 10),
            }),
            &["query"],
        )
    }
}
