//! Fluent prompt builder
//!
//! Used to assemble the message an agent receives for a task: the rendered
//! description, the expected-output criteria and the outputs of upstream
//! tasks.

/// A fluent builder for constructing prompts
///
/// # Examples
///
/// ```
/// use crew_prompt::PromptBuilder;
///
/// let prompt = PromptBuilder::new()
///     .text("Compose the results into a helpful report")
///     .blank_line()
///     .section("Assets")
///     .bullets(["AAPL", "BTC"])
///     .when(false, "never shown")
///     .build_trimmed();
///
/// assert!(prompt.contains("## Assets"));
/// assert!(prompt.contains("- BTC"));
/// assert!(!prompt.contains("never shown"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    parts: Vec<String>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add static text
    pub fn text(mut self, content: impl Into<String>) -> Self {
        self.parts.push(content.into());
        self
    }

    pub fn newline(self) -> Self {
        self.text("\n")
    }

    /// Add a blank line (two newlines)
    pub fn blank_line(self) -> Self {
        self.text("\n\n")
    }

    /// Add a section header (markdown h2)
    pub fn section(self, title: impl Into<String>) -> Self {
        self.text(format!("\n## {}\n", title.into()))
    }

    /// Add content conditionally
    pub fn when(self, condition: bool, content: impl Into<String>) -> Self {
        if condition { self.text(content) } else { self }
    }

    pub fn bullet(self, content: impl Into<String>) -> Self {
        self.text(format!("- {}\n", content.into()))
    }

    pub fn bullets<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for item in items {
            self = self.bullet(item);
        }
        self
    }

    /// Build the final prompt string
    pub fn build(self) -> String {
        self.parts.concat()
    }

    /// Build with surrounding whitespace removed
    pub fn build_trimmed(self) -> String {
        self.build().trim().to_string()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl From<PromptBuilder> for String {
    fn from(builder: PromptBuilder) -> Self {
        builder.build()
    }
}
