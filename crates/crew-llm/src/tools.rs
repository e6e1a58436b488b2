//! Tool definition types for LLM tool use

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool definition sent to the LLM provider
///
/// The name must match the tool registered with the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON schema for the tool's input parameters
    pub input_schema: Value,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Helper module to build JSON schemas for tools
pub mod schema {
    use serde_json::{Value, json};

    /// Create a JSON schema for an object with properties
    ///
    /// # Example
    ///
    /// ```
    /// use crew_llm::tools::schema;
    /// use serde_json::json;
    ///
    /// let schema = schema::object(
    ///     json!({ "ticker": schema::string("Ticker symbol, e.g. AAPL") }),
    ///     &["ticker"],
    /// );
    /// assert_eq!(schema["required"][0], "ticker");
    /// ```
    pub fn object(properties: Value, required: &[&str]) -> Value {
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// String property schema
    pub fn string(description: &str) -> Value {
        json!({
            "type": "string",
            "description": description,
        })
    }

    /// Integer property schema with inclusive bounds
    pub fn integer_range(description: &str, minimum: i64, maximum: i64) -> Value {
        json!({
            "type": "integer",
            "description": description,
            "minimum": minimum,
            "maximum": maximum,
        })
    }
}
