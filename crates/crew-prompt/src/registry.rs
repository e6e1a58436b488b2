//! Prompt template registry

use crate::{PromptError, PromptTemplate, Result};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

/// A thread-safe registry of named prompt templates
///
/// # Examples
///
/// ```
/// use crew_prompt::{JinjaTemplate, PromptRegistry};
/// use serde_json::json;
///
/// let registry = PromptRegistry::new();
/// registry.register(JinjaTemplate::new("greeting", "Hello, {{ name }}!")?);
///
/// let result = registry.render("greeting", &json!({ "name": "World" }))?;
/// assert_eq!(result, "Hello, World!");
/// # Ok::<(), crew_prompt::PromptError>(())
/// ```
#[derive(Default)]
pub struct PromptRegistry {
    templates: RwLock<BTreeMap<String, Arc<dyn PromptTemplate>>>,
}

impl PromptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template, replacing any template with the same name
    pub fn register<T: PromptTemplate + 'static>(&self, template: T) {
        self.register_arc(Arc::new(template));
    }

    pub fn register_arc(&self, template: Arc<dyn PromptTemplate>) {
        self.templates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(template.name().to_string(), template);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn PromptTemplate>> {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Render a registered template
    pub fn render(&self, name: &str, vars: &serde_json::Value) -> Result<String> {
        let template = self
            .get(name)
            .ok_or_else(|| PromptError::TemplateNotRegistered(name.to_string()))?;
        template.render(vars)
    }

    /// Registered names, sorted
    pub fn list(&self) -> Vec<String> {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for PromptRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptRegistry")
            .field("templates", &self.list())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JinjaTemplate;
    use serde_json::json;

    #[test]
    fn test_register_and_render() {
        let registry = PromptRegistry::new();
        assert!(registry.is_empty());

        registry.register(JinjaTemplate::new("price_task", "Analyse {{ ticker }}").unwrap());
        assert!(registry.contains("price_task"));

        let out = registry
            .render("price_task", &json!({ "ticker": "TSLA" }))
            .unwrap();
        assert_eq!(out, "Analyse TSLA");
    }

    #[test]
    fn test_unregistered_template() {
        let registry = PromptRegistry::new();
        let err = registry.render("missing", &json!({})).unwrap_err();
        assert!(matches!(err, PromptError::TemplateNotRegistered(name) if name == "missing"));
    }

    #[test]
    fn test_replace_and_list() {
        let registry = PromptRegistry::new();
        registry.register(JinjaTemplate::new("b", "one").unwrap());
        registry.register(JinjaTemplate::new("a", "two").unwrap());
        registry.register(JinjaTemplate::new("b", "three").unwrap());

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.list(), vec!["a", "b"]);
        assert_eq!(registry.render("b", &json!({})).unwrap(), "three");
    }
}
