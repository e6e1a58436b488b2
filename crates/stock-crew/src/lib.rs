//! Stock analysis crew
//!
//! Three agents work through one ticker:
//!
//! - the Senior Stock Price Analyst reads 52 weeks of daily prices and calls
//!   the trend up, down or sideways
//! - the Stock News Analyst searches news for the ticker and a reference
//!   asset (BTC) and scores fear/greed from 0 to 100 per asset
//! - the Senior Stock Analyst Writer turns both into a markdown newsletter
//!
//! [`StockCrew`] wires the agents, tools and guards onto the crew
//! orchestrator. Market data comes from Yahoo Finance and news from
//! DuckDuckGo, both behind traits so tests can swap them out.
//!
//! # Example
//!
//! ```rust,no_run
//! use crew_utils::ProcessEnv;
//! use stock_crew::{StockCrew, StockCrewConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = StockCrewConfig::from_env(&ProcessEnv)?;
//!     let crew = StockCrew::from_config(config)?;
//!
//!     let output = crew.kickoff("AAPL").await?;
//!     if let Some(newsletter) = output.final_text() {
//!         println!("{newsletter}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod agents;
pub mod analysis;
pub mod api;
pub mod assets;
pub mod cache;
pub mod config;
pub mod crew;
pub mod error;
pub mod prompts;
pub mod summary;
pub mod tools;

pub use config::StockCrewConfig;
pub use crew::{StockCrew, StockCrewBuilder};
pub use error::{Result, StockError};
