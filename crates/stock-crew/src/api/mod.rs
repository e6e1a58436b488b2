//! Market data and news providers

pub mod duckduckgo;
pub mod market;
pub mod news;
pub mod yahoo;

pub use duckduckgo::DuckDuckGoNews;
pub use market::{DailyBar, DateRange, LOOKBACK_WEEKS, MarketData, PriceSeries};
pub use news::{MAX_NEWS_RESULTS, NewsItem, NewsResult, NewsSearch};
pub use yahoo::YahooMarketData;

#[cfg(test)]
pub use market::MockMarketData;
#[cfg(test)]
pub use news::MockNewsSearch;
