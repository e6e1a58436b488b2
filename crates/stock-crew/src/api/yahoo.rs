//! Yahoo Finance market data

use super::market::{DailyBar, DateRange, MarketData, PriceSeries};
use crate::error::{Result, StockError};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{debug, instrument};
use yahoo_finance_api as yahoo;

const PROVIDER: &str = "yahoo";

/// Daily history from Yahoo Finance, no API key required
#[derive(Debug, Clone)]
pub struct YahooMarketData {
    timeout: Duration,
}

impl YahooMarketData {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for YahooMarketData {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl MarketData for YahooMarketData {
    #[instrument(skip(self), fields(provider = PROVIDER, range = %range))]
    async fn daily_history(&self, ticker: &str, range: &DateRange) -> Result<PriceSeries> {
        let start = to_offset_date_time(range.start)?;
        let end = to_offset_date_time(range.end)?;

        let connector = yahoo::YahooConnector::new()
            .map_err(|e| StockError::Config(format!("failed to build Yahoo client: {e}")))?;

        let request = connector.get_quote_history(ticker, start, end);
        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| StockError::Unavailable {
                provider: PROVIDER.to_string(),
                message: format!("no answer within {}s", self.timeout.as_secs()),
            })?
            .map_err(|e| classify_failure(ticker, &e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| StockError::no_data(ticker, e.to_string()))?;

        let bars = quotes
            .iter()
            .filter_map(|q| {
                let date = DateTime::from_timestamp(q.timestamp as i64, 0)?.date_naive();
                Some(DailyBar {
                    date,
                    open: q.open,
                    high: q.high,
                    low: q.low,
                    close: q.close,
                    volume: q.volume,
                })
            })
            .collect();

        let series = PriceSeries::new(ticker, *range, bars);
        debug!(records = series.len(), "Fetched daily history");

        if series.is_empty() {
            return Err(StockError::no_data(
                ticker,
                format!("no daily prices between {} and {}", range.start, range.end),
            ));
        }
        Ok(series)
    }
}

/// Midnight UTC of `date`
fn to_offset_date_time(date: NaiveDate) -> Result<OffsetDateTime> {
    let timestamp = date
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .ok_or_else(|| StockError::Config(format!("invalid date {date}")))?;

    OffsetDateTime::from_unix_timestamp(timestamp)
        .map_err(|e| StockError::Config(format!("invalid timestamp for {date}: {e}")))
}

/// Yahoo reports unknown symbols through the same error type as outages
fn classify_failure(ticker: &str, message: &str) -> StockError {
    let lower = message.to_lowercase();
    let missing = ["not found", "no data", "delisted", "empty", "no quotes", "no result"]
        .iter()
        .any(|needle| lower.contains(needle));

    if missing {
        StockError::no_data(ticker, message)
    } else if lower.contains("too many requests") || lower.contains("429") {
        StockError::RateLimited {
            provider: PROVIDER.to_string(),
        }
    } else {
        StockError::Unavailable {
            provider: PROVIDER.to_string(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crew_tools::Transient;

    #[test]
    fn test_to_offset_date_time() {
        let date: NaiveDate = "2025-06-02".parse().unwrap();
        let odt = to_offset_date_time(date).unwrap();
        assert_eq!(odt.unix_timestamp(), 1_748_822_400);
    }

    #[test]
    fn test_classify_failure() {
        let err = classify_failure(
            "ZZZZ",
            "fetching the data failed: No data found, symbol may be delisted",
        );
        assert!(matches!(err, StockError::NoData { .. }));
        assert!(!err.is_transient());

        let err = classify_failure("AAPL", "HTTP status 429 Too Many Requests");
        assert!(matches!(err, StockError::RateLimited { .. }));

        let err = classify_failure("AAPL", "connection to yahoo! finance server failed");
        assert!(matches!(err, StockError::Unavailable { .. }));
        assert!(err.is_transient());
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_daily_history_live() {
        let range = DateRange::trailing_year(chrono::Utc::now().date_naive());
        let series = YahooMarketData::default()
            .daily_history("AAPL", &range)
            .await
            .unwrap();

        assert_eq!(series.ticker(), "AAPL");
        assert!(series.len() > 200);
        assert!(range.contains(series.first().unwrap().date));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_unknown_symbol_live() {
        let range = DateRange::trailing_year(chrono::Utc::now().date_naive());
        let result = YahooMarketData::default()
            .daily_history("ZZZZNOTREAL", &range)
            .await;
        assert!(result.is_err());
    }
}
