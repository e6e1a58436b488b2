//! Error types for the stock crew

use crew_tools::Transient;
use crew_utils::ConfigError;
use thiserror::Error;

/// Market data, news search and configuration errors
#[derive(Debug, Error)]
pub enum StockError {
    /// Ticker is empty or contains characters no exchange uses
    #[error("Invalid ticker '{0}'")]
    InvalidTicker(String),

    /// Provider answered but had nothing for the request
    #[error("No data for {symbol}: {reason}")]
    NoData { symbol: String, reason: String },

    /// Network or HTTP client error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("{provider} returned HTTP {status}")]
    Http { provider: String, status: u16 },

    /// Provider asked us to slow down
    #[error("Rate limit exceeded for {provider}")]
    RateLimited { provider: String },

    /// Provider failure that may clear up on retry
    #[error("{provider} unavailable: {message}")]
    Unavailable { provider: String, message: String },

    /// Response did not have the expected shape
    #[error("Unexpected response from {provider}: {message}")]
    Parse { provider: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for stock operations
pub type Result<T> = std::result::Result<T, StockError>;

impl StockError {
    pub fn no_data(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NoData {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    /// Convert into the error a tool reports to its agent
    ///
    /// Configuration problems stay configuration errors; everything else
    /// becomes a tool error carrying this message.
    pub fn into_tool_error(self, tool: &str) -> crew_core::Error {
        match self {
            Self::Config(message) => crew_core::Error::Config(message),
            other => crew_core::Error::tool(tool, other.to_string()),
        }
    }
}

impl Transient for StockError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Network(e) => !e.is_builder() && !e.is_decode(),
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            Self::RateLimited { .. } | Self::Unavailable { .. } => true,
            Self::InvalidTicker(_) | Self::NoData { .. } | Self::Parse { .. } | Self::Config(_) => {
                false
            }
        }
    }
}

impl From<ConfigError> for StockError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<StockError> for crew_core::Error {
    fn from(err: StockError) -> Self {
        match err {
            StockError::Config(message) => crew_core::Error::Config(message),
            StockError::InvalidTicker(_) => crew_core::Error::Config(err.to_string()),
            other => crew_core::Error::ProcessingFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StockError::InvalidTicker("A A".to_string());
        assert_eq!(err.to_string(), "Invalid ticker 'A A'");

        let err = StockError::no_data("ZZZZ", "empty price history");
        assert_eq!(err.to_string(), "No data for ZZZZ: empty price history");
    }

    #[test]
    fn test_transient_classification() {
        let http = |status| StockError::Http {
            provider: "duckduckgo".to_string(),
            status,
        };
        assert!(http(503).is_transient());
        assert!(http(429).is_transient());
        assert!(!http(404).is_transient());
        assert!(
            StockError::RateLimited {
                provider: "duckduckgo".to_string()
            }
            .is_transient()
        );
        assert!(!StockError::no_data("ZZZZ", "none").is_transient());
        assert!(!StockError::Config("bad".to_string()).is_transient());
    }

    #[test]
    fn test_tool_error_conversion() {
        let err = StockError::no_data("ZZZZ", "empty price history").into_tool_error("market_data");
        match err {
            crew_core::Error::Tool { tool, message } => {
                assert_eq!(tool, "market_data");
                assert!(message.contains("ZZZZ"));
            }
            other => panic!("expected a tool error, got {other:?}"),
        }

        let err = StockError::Config("missing key".to_string()).into_tool_error("market_data");
        assert!(matches!(err, crew_core::Error::Config(_)));
    }

    #[test]
    fn test_config_errors_stay_config() {
        let err: crew_core::Error =
            StockError::from(ConfigError::Missing("OPENAI_API_KEY".to_string())).into();
        match err {
            crew_core::Error::Config(message) => assert!(message.contains("OPENAI_API_KEY")),
            other => panic!("expected a config error, got {other:?}"),
        }

        let err: crew_core::Error = StockError::InvalidTicker("?".to_string()).into();
        assert!(matches!(err, crew_core::Error::Config(_)));
    }
}
