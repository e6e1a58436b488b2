//! Tool registry for managing available tools

use crate::Tool;
use crew_llm::ToolDefinition;
use std::sync::{Arc, PoisonError, RwLock};

/// Registry of the tools one agent may call
///
/// Registration order is preserved so the definitions sent to the model are
/// stable between runs. Registering a name twice replaces the earlier tool.
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<Vec<Arc<dyn Tool>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of tools
    pub fn from_tools(tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        let registry = Self::new();
        for tool in tools {
            registry.register(tool);
        }
        registry
    }

    /// Register a tool
    pub fn register(&self, tool: Arc<dyn Tool>) {
        let mut tools = self.tools.write().unwrap_or_else(PoisonError::into_inner);
        match tools.iter().position(|t| t.name() == tool.name()) {
            Some(i) => tools[i] = tool,
            None => tools.push(tool),
        }
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|t| t.name() == name)
            .cloned()
    }

    /// All tools, in registration order
    pub fn list_tools(&self) -> Vec<Arc<dyn Tool>> {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.list_tools()
            .iter()
            .map(|t| t.name().to_string())
            .collect()
    }

    /// Definitions for the LLM request
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.list_tools().iter().map(|t| t.definition()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::MockTool;
    use serde_json::json;

    fn mock_tool(name: &'static str, output: &'static str) -> Arc<dyn Tool> {
        let mut tool = MockTool::new();
        tool.expect_name().return_const(name.to_string());
        tool.expect_description().return_const(format!("{name} tool"));
        tool.expect_input_schema().returning(|| json!({"type": "object"}));
        tool.expect_definition().returning(move || {
            ToolDefinition::new(name, format!("{name} tool"), json!({"type": "object"}))
        });
        tool.expect_execute().returning(move |_| Ok(json!(output)));
        Arc::new(tool)
    }

    #[test]
    fn test_register_and_get() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());

        registry.register(mock_tool("market_data", "a"));
        registry.register(mock_tool("news_search", "b"));

        assert_eq!(registry.len(), 2);
        assert!(registry.get("market_data").is_some());
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.names(), vec!["market_data", "news_search"]);
    }

    #[tokio::test]
    async fn test_register_replaces_same_name() {
        let registry = ToolRegistry::from_tools([mock_tool("news_search", "old")]);
        registry.register(mock_tool("news_search", "new"));

        assert_eq!(registry.len(), 1);
        let tool = registry.get("news_search").unwrap();
        assert_eq!(tool.execute(json!({})).await.unwrap(), json!("new"));
    }

    #[test]
    fn test_definitions_follow_registration_order() {
        let registry =
            ToolRegistry::from_tools([mock_tool("b_tool", "1"), mock_tool("a_tool", "2")]);
        let defs = registry.definitions();
        assert_eq!(defs[0].name, "b_tool");
        assert_eq!(defs[1].name, "a_tool");
    }
}
