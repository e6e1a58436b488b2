//! Guards checking each agent's answer before its task completes

use super::trend::words;
use super::{PriceTrend, Report, SentimentReport};
use crate::tools::{MARKET_DATA, NEWS_SEARCH};
use crew_core::Error;
use crew_runtime::{GuardVerdict, OutputGuard, ToolInvocation, last_failure, successful_calls};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

fn accept<T: Serialize>(parsed: &T) -> GuardVerdict {
    GuardVerdict::Accept(serde_json::to_value(parsed).ok())
}

/// Rebuild the tool error from the message the agent was shown
fn tool_error(tool: &str, shown: &str) -> Error {
    let prefix = format!("Tool '{tool}' failed: ");
    let message = shown.strip_prefix("Error: ").unwrap_or(shown);
    Error::tool(tool, message.strip_prefix(&prefix).unwrap_or(message))
}

fn input_str<'a>(call: &'a ToolInvocation, key: &str) -> Option<&'a str> {
    call.input.get(key).and_then(Value::as_str)
}

/// Requires fetched prices for the ticker and a stated trend
#[derive(Debug, Clone)]
pub struct PriceTrendGuard {
    ticker: String,
}

impl PriceTrendGuard {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
        }
    }
}

impl OutputGuard for PriceTrendGuard {
    fn check(&self, output: &str, calls: &[ToolInvocation]) -> GuardVerdict {
        let fetched = successful_calls(calls, MARKET_DATA).any(|c| {
            input_str(c, "ticker").is_some_and(|t| t.trim().eq_ignore_ascii_case(&self.ticker))
        });

        if !fetched {
            let error = match last_failure(calls, MARKET_DATA) {
                Some(shown) => tool_error(MARKET_DATA, shown),
                None => Error::tool(
                    MARKET_DATA,
                    format!("no price history was fetched for {}", self.ticker),
                ),
            };
            return GuardVerdict::Reject(error);
        }

        match PriceTrend::parse(&self.ticker, output) {
            Ok(trend) => accept(&trend),
            Err(e) => GuardVerdict::retry(format!(
                "{e}. State the trend on its own line, for example: {}, price up",
                self.ticker
            )),
        }
    }
}

/// Requires one news search per asset and a complete block for each
#[derive(Debug, Clone)]
pub struct SentimentGuard {
    assets: Vec<String>,
}

impl SentimentGuard {
    pub fn new(assets: Vec<String>) -> Self {
        Self { assets }
    }

    /// Assets a query names, matched on whole words
    fn mentioned(&self, query: &str) -> Vec<&str> {
        let query = words(query);
        self.assets
            .iter()
            .filter(|asset| {
                aliases(asset)
                    .iter()
                    .any(|name| contains_phrase(&query, &words(name)))
            })
            .map(String::as_str)
            .collect()
    }
}

fn aliases(asset: &str) -> Vec<String> {
    let mut names = vec![asset.to_string()];
    match asset.to_uppercase().as_str() {
        "BTC" => names.push("bitcoin".to_string()),
        "ETH" => names.push("ethereum".to_string()),
        _ => {}
    }
    names
}

fn contains_phrase(haystack: &[String], needle: &[String]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|window| window == needle)
}

impl OutputGuard for SentimentGuard {
    fn check(&self, output: &str, calls: &[ToolInvocation]) -> GuardVerdict {
        if let Some(shown) = last_failure(calls, NEWS_SEARCH) {
            return GuardVerdict::Reject(tool_error(NEWS_SEARCH, shown));
        }

        // A query naming several assets counts for none of them
        let mut searched = HashSet::new();
        let mut combined = Vec::new();
        for query in successful_calls(calls, NEWS_SEARCH).filter_map(|c| input_str(c, "query")) {
            match self.mentioned(query).as_slice() {
                [asset] => {
                    searched.insert(*asset);
                }
                [] => {}
                _ => combined.push(query),
            }
        }

        let unsearched: Vec<&str> = self
            .assets
            .iter()
            .map(String::as_str)
            .filter(|a| !searched.contains(a))
            .collect();
        if !unsearched.is_empty() {
            let mut feedback = format!(
                "Search the news for each asset individually with the {NEWS_SEARCH} tool."
            );
            if !combined.is_empty() {
                feedback.push_str(&format!(
                    " One asset per query; these covered several: {}.",
                    combined.join("; ")
                ));
            }
            feedback.push_str(&format!(" Not searched yet: {}", unsearched.join(", ")));
            return GuardVerdict::retry(feedback);
        }

        match SentimentReport::parse(output, &self.assets) {
            Ok(report) => accept(&report),
            Err(e) => GuardVerdict::retry(format!(
                "{e}. For each of {} give four lines: the asset symbol, a one sentence news \
                 summary, the trend (up, down or sideways) and a fear/greed score from 0 to 100.",
                self.assets.join(", ")
            )),
        }
    }
}

/// Requires the newsletter structure and a prediction
#[derive(Debug, Default, Clone, Copy)]
pub struct ReportGuard;

impl OutputGuard for ReportGuard {
    fn check(&self, output: &str, _calls: &[ToolInvocation]) -> GuardVerdict {
        match Report::parse(output) {
            Ok(report) => accept(&report),
            Err(e) => GuardVerdict::retry(format!(
                "{e}. The newsletter needs an executive summary of exactly 3 bullets, an \
                 introduction, a main analysis section and a closing summary with a concrete \
                 up, down or sideways prediction."
            )),
        }
    }
}
