//! The writer's markdown newsletter

use super::ParseError;
use super::trend::Trend;
use serde::{Deserialize, Serialize};

/// Words after which a prediction is stated
const PREDICTION_CUES: &[&str] = &[
    "predict", "forecast", "expect", "outlook", "trend", "direction",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub markdown: String,
    pub executive_summary: [String; 3],
    /// Near-future direction stated in the closing section
    pub prediction: Trend,
}

#[derive(Debug)]
struct Section<'a> {
    title: String,
    lines: Vec<&'a str>,
}

impl Section<'_> {
    fn is_executive(&self) -> bool {
        self.title.contains("executive")
            || self.title.contains("key takeaways")
            || self.title.contains("highlights")
    }

    fn is_intro(&self) -> bool {
        self.title.contains("intro")
    }

    fn is_summary(&self) -> bool {
        !self.is_executive()
            && ["summary", "conclusion", "outlook", "prediction", "final thoughts"]
                .iter()
                .any(|k| self.title.contains(k))
    }

    fn is_main(&self) -> bool {
        !self.is_executive()
            && !self.is_intro()
            && !self.is_summary()
            && ["main", "analysis", "price", "news", "sentiment", "market"]
                .iter()
                .any(|k| self.title.contains(k))
    }

    fn bullets(&self) -> Vec<String> {
        self.lines.iter().filter_map(|l| bullet_text(l)).collect()
    }
}

impl Report {
    pub fn parse(markdown: &str) -> Result<Self, ParseError> {
        let sections = sections(markdown);

        let executive = sections
            .iter()
            .find(|s| s.is_executive())
            .ok_or(ParseError::MissingSection("executive summary"))?;
        let executive_summary: [String; 3] = executive
            .bullets()
            .try_into()
            .map_err(|bullets: Vec<String>| ParseError::ExecutiveSummary(bullets.len()))?;

        if !sections.iter().any(Section::is_intro) {
            return Err(ParseError::MissingSection("introduction"));
        }
        if !sections.iter().any(Section::is_main) {
            return Err(ParseError::MissingSection("main analysis"));
        }
        let closing = sections
            .iter()
            .rev()
            .find(|s| s.is_summary())
            .ok_or(ParseError::MissingSection("summary"))?;

        let prediction = prediction(closing).ok_or(ParseError::MissingPrediction)?;

        Ok(Self {
            markdown: markdown.trim().to_string(),
            executive_summary,
            prediction,
        })
    }
}

/// Split on `#` headings, lone `**bold**` lines and short `Title:` lines
fn sections(markdown: &str) -> Vec<Section<'_>> {
    let mut sections = Vec::new();
    let mut current: Option<Section<'_>> = None;

    for line in markdown.lines() {
        if let Some(title) = heading(line) {
            sections.extend(current.take());
            current = Some(Section {
                title,
                lines: Vec::new(),
            });
        } else if let Some(section) = current.as_mut() {
            section.lines.push(line);
        }
    }
    sections.extend(current);
    sections
}

fn heading(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.starts_with('#') {
        let title = trimmed.trim_start_matches('#').replace("**", "");
        return Some(title.trim().trim_end_matches(':').to_lowercase());
    }

    let bold = trimmed
        .strip_prefix("**")
        .and_then(|t| t.strip_suffix("**").or_else(|| t.strip_suffix("**:")));
    if let Some(title) = bold.filter(|t| !t.contains("**")) {
        return Some(title.trim().trim_end_matches(':').to_lowercase());
    }

    let plain = trimmed.strip_suffix(':')?;
    (plain.len() <= 40 && bullet_text(plain).is_none() && !plain.is_empty())
        .then(|| plain.trim().to_lowercase())
}

/// Text of a `-`, `*`, `•`, `+` or numbered list item
fn bullet_text(line: &str) -> Option<String> {
    let trimmed = line.trim();
    let rest = ["- ", "* ", "• ", "+ "]
        .iter()
        .find_map(|m| trimmed.strip_prefix(m))
        .or_else(|| {
            let digits = trimmed.chars().take_while(char::is_ascii_digit).count();
            (1..=2)
                .contains(&digits)
                .then(|| trimmed[digits..].strip_prefix(". "))
                .flatten()
        })?;
    let text = rest.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn prediction(section: &Section<'_>) -> Option<Trend> {
    let cued = section.lines.iter().find_map(|line| {
        let lower = line.to_lowercase();
        PREDICTION_CUES.iter().find_map(|cue| {
            let at = lower.find(cue)?;
            Trend::find_in_field(&lower[at + cue.len()..])
        })
    });

    cued.or_else(|| Trend::find_in(&section.lines.join("\n")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "\
# AAPL Weekly Newsletter

## Executive Summary
- AAPL gained 18% over the past 52 weeks.
- News flow is positive with a fear/greed score of 72.
- BTC is lagging with a score of 35.

## Introduction
Apple keeps surprising the market.

## Main Analysis
The price trend is up, while Bitcoin sentiment cooled.

## Summary
Strong earnings support the stock. Our prediction for the coming weeks: up.
";

    #[test]
    fn test_parse_report() {
        let report = Report::parse(REPORT).unwrap();

        assert_eq!(report.prediction, Trend::Up);
        assert_eq!(
            report.executive_summary[0],
            "AAPL gained 18% over the past 52 weeks."
        );
        assert_eq!(report.executive_summary[2], "BTC is lagging with a score of 35.");
        assert!(report.markdown.starts_with("# AAPL Weekly Newsletter"));
    }

    #[test]
    fn test_bold_and_colon_headings() {
        let text = "**Executive Summary:**\n1. One\n2. Two\n3. Three\n\n\
                    Introduction:\nSetting the scene.\n\n\
                    **News and Sentiment**\nMixed headlines.\n\n\
                    **Conclusion**\nWe expect prices to move sideways.";

        let report = Report::parse(text).unwrap();
        assert_eq!(report.executive_summary, ["One", "Two", "Three"]);
        assert_eq!(report.prediction, Trend::Sideways);
    }

    #[test]
    fn test_wrong_bullet_count() {
        let text = REPORT.replace("- BTC is lagging with a score of 35.\n", "");
        assert_eq!(Report::parse(&text), Err(ParseError::ExecutiveSummary(2)));
    }

    #[test]
    fn test_missing_sections() {
        let text = REPORT.replace("## Introduction", "## Background");
        assert_eq!(
            Report::parse(&text),
            Err(ParseError::MissingSection("introduction"))
        );

        let text = REPORT.replace("## Summary", "## Closing words");
        assert_eq!(Report::parse(&text), Err(ParseError::MissingSection("summary")));

        assert_eq!(
            Report::parse("Just a paragraph."),
            Err(ParseError::MissingSection("executive summary"))
        );
    }

    #[test]
    fn test_missing_prediction() {
        let text = REPORT.replace(
            "Our prediction for the coming weeks: up.",
            "Time will tell.",
        );
        assert_eq!(Report::parse(&text), Err(ParseError::MissingPrediction));
    }

    #[test]
    fn test_prediction_falls_back_to_strong_words() {
        let text = REPORT.replace(
            "Our prediction for the coming weeks: up.",
            "We remain bearish into the next quarter.",
        );
        assert_eq!(Report::parse(&text).unwrap().prediction, Trend::Down);
    }
}
