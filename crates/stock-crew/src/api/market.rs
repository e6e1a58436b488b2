//! Daily price history and the capability that provides it

use crate::error::Result;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of the look-back window
pub const LOOKBACK_WEEKS: i64 = 52;

/// Half-open date window `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// `[run_date - 52 weeks, run_date)`
    pub fn trailing_year(run_date: NaiveDate) -> Self {
        Self {
            start: run_date - Duration::weeks(LOOKBACK_WEEKS),
            end: run_date,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// One trading day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Daily bars for one ticker, sorted by date, one bar per date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    ticker: String,
    range: DateRange,
    bars: Vec<DailyBar>,
}

impl PriceSeries {
    /// Keep the bars inside `range`, sorted, first bar wins per date
    pub fn new(ticker: impl Into<String>, range: DateRange, bars: Vec<DailyBar>) -> Self {
        let mut bars: Vec<DailyBar> = bars.into_iter().filter(|b| range.contains(b.date)).collect();
        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);

        Self {
            ticker: ticker.into(),
            range,
            bars,
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn bars(&self) -> &[DailyBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn first(&self) -> Option<&DailyBar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&DailyBar> {
        self.bars.last()
    }

    /// Highest high in the window
    pub fn high(&self) -> Option<f64> {
        self.bars.iter().map(|b| b.high).reduce(f64::max)
    }

    /// Lowest low in the window
    pub fn low(&self) -> Option<f64> {
        self.bars.iter().map(|b| b.low).reduce(f64::min)
    }

    /// Percentage change from the first close to the last
    pub fn change_pct(&self) -> Option<f64> {
        let first = self.first()?.close;
        let last = self.last()?.close;
        (first != 0.0).then(|| (last - first) / first * 100.0)
    }
}

/// Source of daily price history
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Daily bars for `ticker` inside `range`
    ///
    /// A symbol or window without data is a [`crate::StockError::NoData`],
    /// never an empty series.
    async fn daily_history(&self, ticker: &str, range: &DateRange) -> Result<PriceSeries>;
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Weekday bars across `range` with a close that moves `step` per day
    pub fn trending_series(ticker: &str, range: &DateRange, start: f64, step: f64) -> PriceSeries {
        let bars = range
            .start
            .iter_days()
            .take_while(|d| *d < range.end)
            .filter(|d| {
                use chrono::Datelike;
                d.weekday().number_from_monday() <= 5
            })
            .enumerate()
            .map(|(i, date)| {
                let close = start + step * i as f64;
                DailyBar {
                    date,
                    open: close - step / 2.0,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 1_000_000,
                }
            })
            .collect();
        PriceSeries::new(ticker, *range, bars)
    }
}
