//! Structured readings of each agent's final answer
//!
//! Agents answer in prose. The types here pull out the parts later tasks and
//! callers rely on, and the guards turn parse failures into retry feedback.

pub mod guard;
pub mod report;
pub mod sentiment;
pub mod trend;

pub use guard::{PriceTrendGuard, ReportGuard, SentimentGuard};
pub use report::Report;
pub use sentiment::{AssetSentiment, SentimentReport, SentimentScore};
pub use trend::{PriceTrend, Trend};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("no price trend (up, down or sideways) stated")]
    MissingTrend,

    #[error("no sentiment block for: {0}")]
    MissingAssets(String),

    #[error("{asset} is missing its {field}")]
    MissingField { asset: String, field: &'static str },

    #[error("{asset} fear/greed score {value} is outside 0-100")]
    AssetScore { asset: String, value: i64 },

    #[error("fear/greed score {0} is outside 0-100")]
    ScoreOutOfRange(i64),

    #[error("executive summary must have exactly 3 bullet points, found {0}")]
    ExecutiveSummary(usize),

    #[error("report is missing the {0} section")]
    MissingSection(&'static str),

    #[error("report states no trend prediction")]
    MissingPrediction,
}
