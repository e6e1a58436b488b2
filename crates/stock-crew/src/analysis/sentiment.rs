//! Per-asset news sentiment
//!
//! The news analyst answers with one block per asset:
//!
//! ```text
//! <ASSET>
//! <SUMMARY>
//! <TREND>
//! <FEAR/GREED SCORE>
//! ```
//!
//! Models decorate this freely (bold headers, `Summary:` labels, `72/100`),
//! so parsing goes line by line and recognises fields by label or shape.

use super::ParseError;
use super::trend::Trend;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fear/greed score, 0 is extreme fear and 100 extreme greed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct SentimentScore(u8);

impl SentimentScore {
    pub const MAX: u8 = 100;

    pub fn new(value: i64) -> Result<Self, ParseError> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= Self::MAX)
            .map(Self)
            .ok_or(ParseError::ScoreOutOfRange(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for SentimentScore {
    type Error = ParseError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SentimentScore> for u8 {
    fn from(score: SentimentScore) -> Self {
        score.0
    }
}

impl fmt::Display for SentimentScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSentiment {
    pub asset: String,
    /// One sentence drawn from the news
    pub summary: String,
    pub trend: Trend,
    pub score: SentimentScore,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentReport {
    /// Market overview preceding the asset blocks
    pub overview: String,
    /// In the order the assets were requested
    pub assets: Vec<AssetSentiment>,
}

#[derive(Debug, Default)]
struct Block {
    asset: String,
    summary: Option<String>,
    trend: Option<Trend>,
    score: Option<i64>,
}

impl Block {
    fn new(asset: &str) -> Self {
        Self {
            asset: asset.to_string(),
            ..Self::default()
        }
    }

    fn is_complete(&self) -> bool {
        self.summary.is_some() && self.trend.is_some() && self.score.is_some()
    }

    fn absorb(&mut self, line: &str) {
        let (label, value) = split_label(line);
        if value.is_empty() {
            return;
        }

        match label.as_deref() {
            Some(l) if l.contains("score") || l.contains("greed") || l.contains("fear") => {
                self.score = self.score.or_else(|| first_integer(value));
            }
            Some(l) if l.contains("trend") || l.contains("prediction") || l.contains("outlook") => {
                self.trend = self.trend.or_else(|| Trend::find_in_field(value));
            }
            Some(l) if l.contains("summary") || l.contains("news") => {
                self.summary.get_or_insert_with(|| value.to_string());
            }
            _ => self.absorb_unlabelled(value),
        }
    }

    fn absorb_unlabelled(&mut self, value: &str) {
        if self.score.is_none() && is_bare_score(value) {
            self.score = first_integer(value);
        } else if self.trend.is_none() && self.summary.is_some() {
            self.trend = Trend::find_in_field(value);
        } else if self.summary.is_none() {
            match value.trim_end_matches('.').to_lowercase().parse::<Trend>() {
                Ok(trend) if self.trend.is_none() => self.trend = Some(trend),
                _ => self.summary = Some(value.to_string()),
            }
        }
    }

    fn finish(self) -> Result<AssetSentiment, ParseError> {
        let missing = |field| ParseError::MissingField {
            asset: self.asset.clone(),
            field,
        };
        let summary = self.summary.clone().ok_or_else(|| missing("summary"))?;
        let trend = self.trend.ok_or_else(|| missing("trend"))?;
        let raw_score = self.score.ok_or_else(|| missing("fear/greed score"))?;
        let score = SentimentScore::new(raw_score).map_err(|_| ParseError::AssetScore {
            asset: self.asset.clone(),
            value: raw_score,
        })?;

        Ok(AssetSentiment {
            asset: self.asset,
            summary,
            trend,
            score,
        })
    }
}

impl SentimentReport {
    /// Parse the news analyst's answer; every asset in `assets` must appear
    pub fn parse(text: &str, assets: &[String]) -> Result<Self, ParseError> {
        let mut overview = Vec::new();
        let mut blocks: Vec<Block> = Vec::new();
        let mut current: Option<Block> = None;

        for raw in text.lines() {
            let line = clean_line(raw);
            if line.is_empty() {
                continue;
            }

            if let Some((asset, rest)) = header(&line, assets) {
                blocks.extend(current.take());
                let mut block = Block::new(asset);
                if !rest.is_empty() {
                    block.absorb(rest);
                }
                current = Some(block);
                continue;
            }

            match current.as_mut() {
                Some(block) if looks_like_other_ticker(&line) && block.summary.is_some() => {
                    blocks.extend(current.take());
                }
                Some(block) => block.absorb(&line),
                None if blocks.is_empty() => overview.push(line),
                None => {}
            }
        }
        blocks.extend(current);

        let missing: Vec<&str> = assets
            .iter()
            .filter(|a| !blocks.iter().any(|b| b.asset == **a))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(ParseError::MissingAssets(missing.join(", ")));
        }

        // A repeated header keeps the first complete block for that asset
        let mut parsed = Vec::with_capacity(assets.len());
        for asset in assets {
            let index = blocks
                .iter()
                .position(|b| b.asset == *asset && b.is_complete())
                .or_else(|| blocks.iter().position(|b| b.asset == *asset));
            if let Some(index) = index {
                parsed.push(blocks.remove(index).finish()?);
            }
        }

        Ok(Self {
            overview: overview.join(" "),
            assets: parsed,
        })
    }

    pub fn asset(&self, asset: &str) -> Option<&AssetSentiment> {
        self.assets.iter().find(|a| a.asset.eq_ignore_ascii_case(asset))
    }
}

/// Strip list markers, heading hashes and emphasis
fn clean_line(raw: &str) -> String {
    let mut line = raw.trim();
    line = line.trim_start_matches('#').trim_start();
    for marker in ["- ", "* ", "• ", "+ "] {
        if let Some(rest) = line.strip_prefix(marker) {
            line = rest.trim_start();
            break;
        }
    }
    if let Some(rest) = strip_numbering(line) {
        line = rest;
    }
    line.replace("**", "").replace("__", "").trim().to_string()
}

/// "1. " or "2) "
fn strip_numbering(line: &str) -> Option<&str> {
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 || digits > 2 {
        return None;
    }
    let rest = &line[digits..];
    rest.strip_prefix(". ")
        .or_else(|| rest.strip_prefix(") "))
        .map(str::trim_start)
}

/// `Label: value` when the label is short and wordy
fn split_label(line: &str) -> (Option<String>, &str) {
    if let Some((label, value)) = line.split_once(':') {
        let wordy = label.len() <= 30
            && label
                .chars()
                .all(|c| c.is_alphabetic() || c.is_whitespace() || matches!(c, '/' | '-' | '&'));
        if wordy && !label.trim().is_empty() {
            return (Some(label.trim().to_lowercase()), value.trim());
        }
    }
    (None, line.trim())
}

/// Recognise `AAPL`, `AAPL:`, `AAPL (Apple Inc.)`, `Asset: BTC` or `Bitcoin (BTC)`
fn header<'a>(line: &'a str, assets: &'a [String]) -> Option<(&'a str, &'a str)> {
    let (label, value) = split_label(line);
    let candidate = match label.as_deref() {
        Some(l) if l.contains("asset") || l.contains("stock") || l.contains("ticker") => value,
        _ => line,
    };

    assets.iter().find_map(|asset| {
        let upper = candidate.to_uppercase();
        if upper == *asset {
            return Some((asset.as_str(), ""));
        }
        if upper.starts_with(asset.as_str()) {
            let rest = candidate.get(asset.len()..).unwrap_or_default().trim_start();
            if let Some(inline) = rest.strip_prefix(':') {
                return Some((asset.as_str(), inline.trim()));
            }
            // `AAPL (Apple Inc.)` is a header, `BTC (Bitcoin) slid` is a summary
            let decorated = match rest.strip_prefix('(') {
                Some(inner) => inner.find(')').is_some_and(|end| {
                    let after = inner.get(end + 1..).unwrap_or_default();
                    after.trim().trim_end_matches(':').is_empty()
                }),
                None => rest.starts_with("- ") || rest.starts_with("– "),
            };
            if decorated && candidate.len() <= 40 {
                return Some((asset.as_str(), ""));
            }
        }
        let parenthesised = format!("({asset})");
        let trailing = upper.trim_end_matches(':').ends_with(&parenthesised);
        (trailing && candidate.len() <= 40).then_some((asset.as_str(), ""))
    })
}

/// A bare symbol line such as `ETH`
fn looks_like_other_ticker(line: &str) -> bool {
    let line = line.trim_end_matches(':');
    (2..=6).contains(&line.len())
        && line.chars().any(|c| c.is_ascii_uppercase())
        && line.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        && line.parse::<Trend>().is_err()
}

fn is_bare_score(value: &str) -> bool {
    let value = value.trim().trim_end_matches('.');
    let value = value.strip_suffix("/100").unwrap_or(value).trim();
    !value.is_empty()
        && value
            .strip_prefix('-')
            .unwrap_or(value)
            .chars()
            .all(|c| c.is_ascii_digit())
}

fn first_integer(value: &str) -> Option<i64> {
    let start = value.find(|c: char| c.is_ascii_digit())?;
    let negative = value[..start].ends_with('-');
    let digits: String = value[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    let number: i64 = digits.parse().ok()?;
    Some(if negative { -number } else { number })
}
