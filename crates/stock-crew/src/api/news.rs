//! News search results and the capability that provides them

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Most results any single query returns
pub const MAX_NEWS_RESULTS: usize = 10;

/// One news hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub snippet: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Publication date as `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
}

/// Results of one query, at most [`MAX_NEWS_RESULTS`] items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsResult {
    query: String,
    items: Vec<NewsItem>,
}

impl NewsResult {
    pub fn new(query: impl Into<String>, mut items: Vec<NewsItem>) -> Self {
        items.truncate(MAX_NEWS_RESULTS);
        Self {
            query: query.into(),
            items,
        }
    }

    pub fn empty(query: impl Into<String>) -> Self {
        Self::new(query, Vec::new())
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn items(&self) -> &[NewsItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Keep the first `limit` items
    pub fn truncated(mut self, limit: usize) -> Self {
        self.items.truncate(limit.min(MAX_NEWS_RESULTS));
        self
    }
}

/// News-category web search
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsSearch: Send + Sync {
    /// Recent news for `query`; no hits is an empty result, not an error
    async fn search_news(&self, query: &str, limit: usize) -> Result<NewsResult>;
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_is_capped() {
        let result = NewsResult::new("AAPL stock", fixtures::items("AAPL", 14));
        assert_eq!(result.len(), MAX_NEWS_RESULTS);
        assert_eq!(result.query(), "AAPL stock");

        let result = result.truncated(3);
        assert_eq!(result.len(), 3);
        assert_eq!(result.items()[2].title, "AAPL headline 3");
    }

    #[test]
    fn test_empty_result() {
        let result = NewsResult::empty("nothing here");
        assert!(result.is_empty());
    }

    #[test]
    fn test_item_serialization_skips_missing_fields() {
        let item = NewsItem {
            title: "t".to_string(),
            snippet: "s".to_string(),
            source: "src".to_string(),
            url: None,
            published: None,
        };
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({ "title": "t", "snippet": "s", "source": "src" })
        );
    }
}
