//! Tickers and the asset set covered by the news analyst

use crate::error::{Result, StockError};

/// Ticker analysed when none is given
pub const DEFAULT_TICKER: &str = "AAPL";

/// Asset the news analyst always covers next to the ticker
pub const DEFAULT_REFERENCE_ASSET: &str = "BTC";

const MAX_TICKER_LEN: usize = 15;

/// Trim and upper-case a ticker, rejecting anything that cannot be a symbol
///
/// Letters, digits and `.`, `^`, `=`, `-` are allowed (`BRK.B`, `^GSPC`,
/// `EURUSD=X`, `BTC-USD`).
pub fn normalize_ticker(raw: &str) -> Result<String> {
    let ticker = raw.trim().to_ascii_uppercase();
    let valid = !ticker.is_empty()
        && ticker.len() <= MAX_TICKER_LEN
        && ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '^' | '=' | '-'));

    if valid {
        Ok(ticker)
    } else {
        Err(StockError::InvalidTicker(raw.trim().to_string()))
    }
}

/// The ticker followed by the reference asset, unless it is the ticker
pub fn asset_set(ticker: &str, reference: &str) -> Vec<String> {
    let mut assets = vec![ticker.to_string()];
    if !reference.eq_ignore_ascii_case(ticker) {
        assets.push(reference.to_string());
    }
    assets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_ticker() {
        assert_eq!(normalize_ticker(" aapl ").unwrap(), "AAPL");
        assert_eq!(normalize_ticker("brk.b").unwrap(), "BRK.B");
        assert_eq!(normalize_ticker("^gspc").unwrap(), "^GSPC");
        assert_eq!(normalize_ticker("BTC-USD").unwrap(), "BTC-USD");

        assert!(normalize_ticker("").is_err());
        assert!(normalize_ticker("   ").is_err());
        assert!(normalize_ticker("AA PL").is_err());
        assert!(normalize_ticker("AAPL;rm").is_err());
        assert!(normalize_ticker("ABCDEFGHIJKLMNOP").is_err());
    }

    #[test]
    fn test_asset_set_always_adds_reference() {
        assert_eq!(asset_set("AAPL", "BTC"), vec!["AAPL", "BTC"]);
        assert_eq!(asset_set("BTC", "BTC"), vec!["BTC"]);
        assert_eq!(asset_set("btc", "BTC"), vec!["btc"]);
    }
}
