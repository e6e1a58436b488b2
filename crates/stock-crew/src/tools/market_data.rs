//! Trailing-year price history for one ticker

use super::MARKET_DATA;
use crate::api::{DateRange, MarketData, PriceSeries};
use crate::assets::normalize_ticker;
use crate::cache::StockCache;
use crate::error::{Result, StockError};
use async_trait::async_trait;
use chrono::NaiveDate;
use crew_llm::tools::schema;
use crew_tools::{RetryPolicy, Tool, parse_params};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use ta::Next;
use ta::indicators::SimpleMovingAverage;
use tracing::{info, instrument};

/// Closes listed verbatim at the end of the summary
const RECENT_CLOSES: usize = 30;

/// A move beyond this share of the starting price counts as a trend
const TREND_THRESHOLD_PCT: f64 = 5.0;

#[derive(Debug, Deserialize)]
struct MarketDataParams {
    ticker: String,
}

/// Fetches 52 weeks of daily prices ending at the run date
pub struct MarketDataTool {
    provider: Arc<dyn MarketData>,
    cache: StockCache<PriceSeries>,
    retry: RetryPolicy,
    run_date: NaiveDate,
}

impl MarketDataTool {
    pub fn new(
        provider: Arc<dyn MarketData>,
        cache: StockCache<PriceSeries>,
        retry: RetryPolicy,
        run_date: NaiveDate,
    ) -> Self {
        Self {
            provider,
            cache,
            retry,
            run_date,
        }
    }

    #[instrument(skip(self), fields(tool = MARKET_DATA))]
    async fn fetch(&self, ticker: &str) -> Result<Value> {
        let ticker = normalize_ticker(ticker)?;
        let range = DateRange::trailing_year(self.run_date);
        let key = format!("{ticker}:{range}");

        let series = self
            .cache
            .get_or_fetch(&key, || {
                self.retry
                    .execute("daily_history", || self.provider.daily_history(&ticker, &range))
            })
            .await?;

        if series.is_empty() {
            return Err(StockError::no_data(&ticker, format!("no trading days in {range}")));
        }

        info!(ticker = %ticker, records = series.len(), "Price history ready");
        summarize(&series)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn sma(closes: &[f64], period: usize) -> Result<Option<f64>> {
    if closes.len() < period {
        return Ok(None);
    }
    let mut indicator = SimpleMovingAverage::new(period)
        .map_err(|e| StockError::Config(format!("invalid SMA period {period}: {e}")))?;
    Ok(closes.iter().map(|c| indicator.next(*c)).last().map(round2))
}

/// Heuristic direction from the yearly change and the 50-day average
fn trend_hint(change_pct: f64, last_close: f64, sma_50: Option<f64>) -> &'static str {
    let above_sma = sma_50.is_none_or(|avg| last_close >= avg);
    let below_sma = sma_50.is_none_or(|avg| last_close <= avg);
    if change_pct > TREND_THRESHOLD_PCT && above_sma {
        "up"
    } else if change_pct < -TREND_THRESHOLD_PCT && below_sma {
        "down"
    } else {
        "sideways"
    }
}

/// Compact JSON view of a series; the full year of bars would swamp the prompt
fn summarize(series: &PriceSeries) -> Result<Value> {
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return Err(StockError::no_data(series.ticker(), "empty series"));
    };
    let closes = series.closes();
    let change_pct = series.change_pct().unwrap_or_default();
    let sma_20 = sma(&closes, 20)?;
    let sma_50 = sma(&closes, 50)?;

    let recent: Vec<Value> = series.bars()[series.len().saturating_sub(RECENT_CLOSES)..]
        .iter()
        .map(|bar| json!({ "date": bar.date.to_string(), "close": round2(bar.close) }))
        .collect();

    Ok(json!({
        "ticker": series.ticker(),
        "range": series.range().to_string(),
        "records": series.len(),
        "first_close": { "date": first.date.to_string(), "close": round2(first.close) },
        "last_close": { "date": last.date.to_string(), "close": round2(last.close) },
        "high_52w": series.high().map(round2),
        "low_52w": series.low().map(round2),
        "change_pct": round2(change_pct),
        "sma_20": sma_20,
        "sma_50": sma_50,
        "trend_hint": trend_hint(change_pct, last.close, sma_50),
        "recent_closes": recent,
    }))
}

#[async_trait]
impl Tool for MarketDataTool {
    async fn execute(&self, params: Value) -> crew_core::Result<Value> {
        let params: MarketDataParams = parse_params(MARKET_DATA, params)?;
        self.fetch(&params.ticker)
            .await
            .map_err(|e| e.into_tool_error(MARKET_DATA))
    }

    fn name(&self) -> &str {
        MARKET_DATA
    }

    fn description(&self) -> &str {
        "Fetch the last 52 weeks of daily stock prices for a ticker from Yahoo Finance. \
         Returns the yearly change, 52-week high and low, moving averages and recent closes."
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({ "ticker": schema::string("Ticker symbol, e.g. AAPL") }),
            &["ticker"],
        )
    }
}
