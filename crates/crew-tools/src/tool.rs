//! Tool trait definition

use async_trait::async_trait;
use crew_core::Result;
use crew_llm::ToolDefinition;
use serde_json::Value;

/// Trait for tools that agents can execute
///
/// Tools are how agents reach the outside world. Failures are reported as
/// [`crew_core::Error::Tool`]; the executor hands them back to the model as
/// error results instead of aborting the task.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Tool: Send + Sync {
    /// Execute the tool with given parameters
    ///
    /// `params` should match [`Tool::input_schema`].
    async fn execute(&self, params: Value) -> Result<Value>;

    /// Unique tool name, as the model sees it
    fn name(&self) -> &str;

    /// Helps the model decide when to call the tool
    fn description(&self) -> &str;

    /// JSON schema of the parameters
    fn input_schema(&self) -> Value;

    /// Definition sent to the LLM provider
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.input_schema())
    }
}

/// Deserialize tool parameters, mapping failures to a tool error
pub fn parse_params<T: serde::de::DeserializeOwned>(tool: &str, params: Value) -> Result<T> {
    serde_json::from_value(params)
        .map_err(|e| crew_core::Error::tool(tool, format!("Invalid parameters: {e}")))
}
