//! Trend classification and the price analyst's answer

use super::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Direction of a price or sentiment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Sideways,
}

/// Words that may follow "price" before the direction
const FILLER: &[&str] = &[
    "is", "are", "has", "been", "was", "currently", "trend", "trending", "moving", "going",
    "heading", "action", "overall", "clearly",
];

impl Trend {
    /// Unambiguous synonyms only
    fn from_strong_word(word: &str) -> Option<Self> {
        match word {
            "upward" | "upwards" | "uptrend" | "bullish" | "rising" => Some(Self::Up),
            "downward" | "downwards" | "downtrend" | "bearish" | "falling" => Some(Self::Down),
            "sideways" | "range-bound" | "rangebound" | "consolidating" => Some(Self::Sideways),
            _ => None,
        }
    }

    fn from_word(word: &str) -> Option<Self> {
        match word {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "flat" | "neutral" => Some(Self::Sideways),
            other => Self::from_strong_word(other),
        }
    }

    /// First trend word in free text, ignoring bare "up"/"down"/"flat"
    pub fn find_in(text: &str) -> Option<Self> {
        words(text).iter().find_map(|w| Self::from_strong_word(w))
    }

    /// First trend word in a short field value, bare "up"/"down" included
    pub fn find_in_field(text: &str) -> Option<Self> {
        words(text).iter().find_map(|w| Self::from_word(w))
    }

    /// Direction stated right after an anchor word such as "price"
    fn after_anchor(words: &[String], anchors: &[&str]) -> Option<Self> {
        words.iter().enumerate().find_map(|(i, word)| {
            if !anchors.contains(&word.as_str()) {
                return None;
            }
            words[i + 1..]
                .iter()
                .skip_while(|w| FILLER.contains(&w.as_str()))
                .take(1)
                .find_map(|w| Self::from_word(w))
        })
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Sideways => "sideways",
        };
        f.write_str(s)
    }
}

impl FromStr for Trend {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_word(s.trim().to_lowercase().as_str()).ok_or(ParseError::MissingTrend)
    }
}

/// Lower-cased words, hyphens kept
pub(crate) fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .map(|w| w.trim_matches('-').to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

/// The price analyst's classification, e.g. `AAPL, price up`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTrend {
    pub ticker: String,
    pub trend: Trend,
    /// Everything besides the classification line
    pub commentary: String,
}

impl PriceTrend {
    /// Find the classification line in an answer
    ///
    /// The first line that states "price <trend>" (or "trend: <trend>")
    /// wins; failing that, the first line with an unambiguous trend word.
    pub fn parse(ticker: &str, text: &str) -> Result<Self, ParseError> {
        let lines: Vec<&str> = text.lines().collect();

        let anchored = lines.iter().enumerate().find_map(|(i, line)| {
            Trend::after_anchor(&words(line), &["price", "prices", "trend"]).map(|t| (i, t))
        });
        let (index, trend) = anchored
            .or_else(|| {
                lines
                    .iter()
                    .enumerate()
                    .find_map(|(i, line)| Trend::find_in(line).map(|t| (i, t)))
            })
            .ok_or(ParseError::MissingTrend)?;

        let commentary = lines
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, line)| *line)
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string();

        Ok(Self {
            ticker: ticker.to_string(),
            trend,
            commentary,
        })
    }

    /// Canonical one-line form
    pub fn classification(&self) -> String {
        format!("{}, price {}", self.ticker, self.trend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trend_display_and_parse() {
        assert_eq!(Trend::Up.to_string(), "up");
        assert_eq!("Sideways".parse::<Trend>().unwrap(), Trend::Sideways);
        assert_eq!(" bearish ".parse::<Trend>().unwrap(), Trend::Down);
        assert!("maybe".parse::<Trend>().is_err());
        assert_eq!(serde_json::to_value(Trend::Down).unwrap(), "down");
    }

    #[test]
    fn test_find_in_ignores_ambiguous_words() {
        assert_eq!(Trend::find_in("Sales picked up but the chart is bearish"), Some(Trend::Down));
        assert_eq!(Trend::find_in("prices went up to 200"), None);
        assert_eq!(Trend::find_in_field("Up"), Some(Trend::Up));
        assert_eq!(Trend::find_in_field("flat, waiting for earnings"), Some(Trend::Sideways));
    }

    #[test]
    fn test_parse_price_trend_line() {
        let answer = "stock='AAPL, price up'\nThe stock gained 18% over 52 weeks.";
        let parsed = PriceTrend::parse("AAPL", answer).unwrap();

        assert_eq!(parsed.trend, Trend::Up);
        assert_eq!(parsed.commentary, "The stock gained 18% over 52 weeks.");
        assert_eq!(parsed.classification(), "AAPL, price up");
    }

    #[test]
    fn test_parse_price_trend_variants() {
        let parsed = PriceTrend::parse("TSLA", "Current trend: Sideways").unwrap();
        assert_eq!(parsed.trend, Trend::Sideways);

        let parsed = PriceTrend::parse("MSFT", "MSFT price is currently trending down.").unwrap();
        assert_eq!(parsed.trend, Trend::Down);

        let parsed =
            PriceTrend::parse("NVDA", "Volume picked up.\nNVDA remains in a clear uptrend.").unwrap();
        assert_eq!(parsed.trend, Trend::Up);
        assert_eq!(parsed.commentary, "Volume picked up.");
    }

    #[test]
    fn test_parse_price_trend_missing() {
        assert_eq!(
            PriceTrend::parse("AAPL", "I could not retrieve any data."),
            Err(ParseError::MissingTrend)
        );
    }
}
