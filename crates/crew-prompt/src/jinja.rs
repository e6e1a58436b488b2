//! MiniJinja-based template implementation
//!
//! Task descriptions and expected outputs are written with Jinja2
//! placeholders such as `{{ ticker }}` and `{{ current_date }}`, then
//! rendered against the crew inputs at kickoff.

use crate::{PromptError, PromptTemplate, Result};
use minijinja::{Environment, UndefinedBehavior};

/// A prompt template backed by MiniJinja
///
/// The source is parsed when the template is created, so a malformed
/// template fails at assembly time rather than mid-run. Rendering is strict:
/// referencing a variable that was not supplied is an error.
///
/// # Examples
///
/// ```
/// use crew_prompt::{JinjaTemplate, PromptTemplate};
/// use serde_json::json;
///
/// let template = JinjaTemplate::new("price_task", "Analyse the {{ ticker }} stock price history")?;
/// let rendered = template.render(&json!({ "ticker": "AAPL" }))?;
/// assert_eq!(rendered, "Analyse the AAPL stock price history");
/// # Ok::<(), crew_prompt::PromptError>(())
/// ```
#[derive(Clone)]
pub struct JinjaTemplate {
    name: String,
    source: String,
}

impl JinjaTemplate {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let source = source.into();

        let env = Environment::new();
        env.template_from_str(&source)
            .map_err(|e| PromptError::TemplateParseFailed {
                name: name.clone(),
                detail: e.to_string(),
            })?;

        Ok(Self { name, source })
    }

    fn environment() -> Environment<'static> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        env
    }
}

impl PromptTemplate for JinjaTemplate {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, vars: &serde_json::Value) -> Result<String> {
        let env = Self::environment();
        let value = minijinja::Value::from_serialize(vars);

        env.render_str(&self.source, value)
            .map_err(|e| PromptError::RenderError {
                name: self.name.clone(),
                detail: e.to_string(),
            })
    }

    fn raw_template(&self) -> &str {
        &self.source
    }
}

impl std::fmt::Debug for JinjaTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JinjaTemplate")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
