//! Prompt templates of the stock crew
//!
//! - `personas`: goal and backstory of each agent
//! - `tasks`: description and expected output of each task
//!
//! Templates use `ticker`, `current_date`, `assets` and `reference_asset`.

mod personas;
mod tasks;

pub use personas::*;
pub use tasks::*;

use crew_prompt::{PromptError, PromptRegistry, Result};

/// Register all stock crew prompts with the given registry
pub fn register_prompts(registry: &PromptRegistry) -> Result<()> {
    registry.register(price_analyst_goal()?);
    registry.register(price_analyst_backstory()?);
    registry.register(news_analyst_goal()?);
    registry.register(news_analyst_backstory()?);
    registry.register(writer_goal()?);
    registry.register(writer_backstory()?);

    registry.register(price_task()?);
    registry.register(price_task_output()?);
    registry.register(news_task()?);
    registry.register(news_task_output()?);
    registry.register(write_task()?);
    registry.register(write_task_output()?);

    Ok(())
}

/// A registry holding every stock crew prompt
pub fn stock_prompts() -> Result<PromptRegistry> {
    let registry = PromptRegistry::new();
    register_prompts(&registry)?;
    Ok(registry)
}

/// Template source of `name`, rendered later against the run inputs
pub fn source(registry: &PromptRegistry, name: &str) -> Result<String> {
    registry
        .get(name)
        .map(|t| t.raw_template().to_string())
        .ok_or_else(|| PromptError::TemplateNotRegistered(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars() -> serde_json::Value {
        json!({
            "ticker": "AAPL",
            "current_date": "2025-06-02",
            "assets": ["AAPL", "BTC"],
            "reference_asset": "BTC",
        })
    }

    #[test]
    fn test_all_prompts_render() {
        let registry = stock_prompts().unwrap();
        assert_eq!(registry.len(), 12);

        for name in registry.list() {
            let rendered = registry.render(&name, &vars()).unwrap();
            assert!(!rendered.contains("{{"), "{name} left a placeholder");
        }
    }

    #[test]
    fn test_news_task_lists_assets() {
        let registry = stock_prompts().unwrap();
        let rendered = registry.render(NEWS_TASK, &vars()).unwrap();

        assert!(rendered.contains("always include BTC"));
        assert!(rendered.contains("individually: AAPL, BTC."));
        assert!(rendered.contains("The current date is 2025-06-02."));
    }

    #[test]
    fn test_missing_input_fails() {
        let registry = stock_prompts().unwrap();
        assert!(registry.render(PRICE_TASK, &json!({ "ticker": "AAPL" })).is_err());
    }

    #[test]
    fn test_source_lookup() {
        let registry = stock_prompts().unwrap();
        assert!(source(&registry, PRICE_ANALYST_GOAL).unwrap().contains("{{ ticker }}"));
        assert!(matches!(
            source(&registry, "stock.unknown"),
            Err(PromptError::TemplateNotRegistered(_))
        ));
    }
}
