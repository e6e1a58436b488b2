//! Tools the stock agents call

pub mod market_data;
pub mod news_search;

pub use market_data::MarketDataTool;
pub use news_search::NewsSearchTool;

/// Tool name of [`MarketDataTool`]
pub const MARKET_DATA: &str = "market_data";
/// Tool name of [`NewsSearchTool`]
pub const NEWS_SEARCH: &str = "news_search";
