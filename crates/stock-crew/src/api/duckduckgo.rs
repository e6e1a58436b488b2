//! DuckDuckGo news search
//!
//! Two requests per query: the search page yields a `vqd` token, which the
//! `news.js` endpoint requires alongside the query.

use super::news::{MAX_NEWS_RESULTS, NewsItem, NewsResult, NewsSearch};
use crate::error::{Result, StockError};
use async_trait::async_trait;
use chrono::DateTime;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

const PROVIDER: &str = "duckduckgo";
const USER_AGENT: &str = concat!("stock-crew/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct NewsPayload {
    #[serde(default)]
    results: Vec<RawNews>,
}

#[derive(Debug, Deserialize)]
struct RawNews {
    #[serde(default)]
    title: String,
    #[serde(default)]
    excerpt: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    url: Option<String>,
    /// Unix seconds
    #[serde(default)]
    date: Option<i64>,
}

/// News search against DuckDuckGo's news vertical
pub struct DuckDuckGoNews {
    client: Client,
    base_url: Url,
    rate_limiter: SharedRateLimiter,
    vqd_pattern: Regex,
    tag_pattern: Regex,
}

impl DuckDuckGoNews {
    /// Create a client with rate limiting
    ///
    /// # Arguments
    /// * `base_url` - Site root, `https://duckduckgo.com` in production
    /// * `requests_per_minute` - Outbound request quota
    /// * `timeout` - Per-request timeout
    pub fn new(base_url: &str, requests_per_minute: u32, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| StockError::Config(format!("invalid news base URL '{base_url}': {e}")))?;

        let quota =
            Quota::per_minute(NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN));

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| StockError::Config(format!("failed to build HTTP client: {e}")))?;

        let vqd_pattern = Regex::new(r#"vqd=["']?([0-9-]+)"#)
            .map_err(|e| StockError::Config(e.to_string()))?;
        let tag_pattern =
            Regex::new(r"<[^>]+>").map_err(|e| StockError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
            vqd_pattern,
            tag_pattern,
        })
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| StockError::Config(format!("invalid news endpoint '{path}': {e}")))?;
        url.query_pairs_mut().extend_pairs(params);
        Ok(url)
    }

    async fn get_text(&self, url: Url) -> Result<String> {
        self.rate_limiter.until_ready().await;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(StockError::RateLimited {
                provider: PROVIDER.to_string(),
            });
        }
        if !status.is_success() {
            return Err(StockError::Http {
                provider: PROVIDER.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }

    async fn token(&self, query: &str) -> Result<String> {
        let url = self.endpoint("/", &[("q", query), ("iar", "news"), ("ia", "news")])?;
        let page = self.get_text(url).await?;

        self.vqd_pattern
            .captures(&page)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| StockError::Parse {
                provider: PROVIDER.to_string(),
                message: "search page carried no vqd token".to_string(),
            })
    }

    fn clean(&self, text: &str) -> String {
        let stripped = self.tag_pattern.replace_all(text, "");
        let decoded = stripped
            .replace("&amp;", "&")
            .replace("&quot;", "\"")
            .replace("&#x27;", "'")
            .replace("&#39;", "'")
            .replace("&lt;", "<")
            .replace("&gt;", ">");
        decoded.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn to_item(&self, raw: RawNews) -> Option<NewsItem> {
        let title = self.clean(&raw.title);
        if title.is_empty() {
            return None;
        }
        Some(NewsItem {
            title,
            snippet: self.clean(&raw.excerpt),
            source: self.clean(&raw.source),
            url: raw.url.filter(|u| !u.is_empty()),
            published: raw
                .date
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
                .map(|dt| dt.date_naive().to_string()),
        })
    }
}

#[async_trait]
impl NewsSearch for DuckDuckGoNews {
    #[instrument(skip(self), fields(provider = PROVIDER))]
    async fn search_news(&self, query: &str, limit: usize) -> Result<NewsResult> {
        let vqd = self.token(query).await?;
        let url = self.endpoint(
            "/news.js",
            &[
                ("l", "us-en"),
                ("o", "json"),
                ("noamp", "1"),
                ("q", query),
                ("vqd", vqd.as_str()),
                ("p", "-1"),
            ],
        )?;

        let body = self.get_text(url).await?;
        let payload: NewsPayload = serde_json::from_str(&body).map_err(|e| StockError::Parse {
            provider: PROVIDER.to_string(),
            message: e.to_string(),
        })?;

        let limit = limit.clamp(1, MAX_NEWS_RESULTS);
        let items: Vec<NewsItem> = payload
            .results
            .into_iter()
            .filter_map(|raw| self.to_item(raw))
            .take(limit)
            .collect();

        debug!(results = items.len(), "News search finished");
        Ok(NewsResult::new(query, items))
    }
}

impl std::fmt::Debug for DuckDuckGoNews {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDuckGoNews")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}
