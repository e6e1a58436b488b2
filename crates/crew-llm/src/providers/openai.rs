//! OpenAI chat-completions provider
//!
//! Works against api.openai.com and any OpenAI-compatible endpoint (local
//! llama.cpp / vLLM / LM Studio servers, Azure deployments) by changing the
//! base URL.
//!
//! ```no_run
//! use crew_llm::{CompletionRequest, LLMProvider, Message};
//! use crew_llm::providers::{OpenAIConfig, OpenAIProvider};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = OpenAIProvider::with_config(
//!     OpenAIConfig::new("sk-...").with_timeout(60),
//! )?;
//! let request = CompletionRequest::builder("gpt-3.5-turbo")
//!     .add_message(Message::user("Is AAPL trending up?"))
//!     .build();
//! let response = provider.complete(request).await?;
//! println!("{:?}", response.message.text());
//! # Ok(())
//! # }
//! ```

use crate::{
    CompletionRequest, CompletionResponse, ContentBlock, LLMError, LLMProvider, Message,
    MessageContent, Result, Role, StopReason, TokenUsage, ToolDefinition,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Default API base
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
/// Environment variable holding the credential
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Environment variable overriding the base URL
pub const API_BASE_ENV: &str = "OPENAI_API_BASE";

const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for [`OpenAIProvider`]
#[derive(Clone)]
pub struct OpenAIConfig {
    pub api_key: String,

    /// Base URL, without the trailing `/chat/completions`
    pub api_base: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Read `OPENAI_API_KEY` (required) and `OPENAI_API_BASE` (optional)
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                LLMError::ConfigurationError(format!("{API_KEY_ENV} environment variable not set"))
            })?;

        let config = Self::new(api_key);
        Ok(match std::env::var(API_BASE_ENV) {
            Ok(base) if !base.trim().is_empty() => config.with_api_base(base),
            _ => config,
        })
    }

    /// Point the provider at another OpenAI-compatible endpoint
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

impl std::fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// OpenAI chat-completions provider
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    /// Create a provider; fails on a blank API key before any request is sent
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(LLMError::ConfigurationError(format!(
                "{API_KEY_ENV} must not be empty"
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(OpenAIConfig::new(api_key))
    }

    pub fn from_env() -> Result<Self> {
        Self::with_config(OpenAIConfig::from_env()?)
    }

    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    #[instrument(skip(self, request), fields(model = %request.model, api_base = %self.config.api_base))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let model = request.model.clone();
        let body = ChatRequest {
            model: request.model,
            messages: to_wire_messages(request.system, request.messages),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            tools: request
                .tools
                .as_deref()
                .map(|tools| tools.iter().map(WireTool::from).collect()),
        };

        debug!(message_count = body.messages.len(), "Sending chat completion");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Chat completion rejected");
            return Err(match status.as_u16() {
                401 | 403 => LLMError::AuthenticationFailed,
                429 => LLMError::RateLimitExceeded(detail),
                400 => LLMError::InvalidRequest(detail),
                404 => LLMError::ModelNotFound(model),
                code => LLMError::RequestFailed(format!("HTTP {code}: {detail}")),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LLMError::UnexpectedResponse(format!("Failed to parse response: {e}")))?;

        let usage = parsed.usage.map_or_else(TokenUsage::default, |u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        });

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::UnexpectedResponse("No choices in response".to_string()))?;

        let message = from_wire_message(choice.message);
        let stop_reason = match choice.finish_reason.as_deref() {
            Some("length") => StopReason::MaxTokens,
            Some("tool_calls" | "function_call") => StopReason::ToolUse,
            // Some compatible servers report "stop" even when tools were called
            _ if message.has_tool_uses() => StopReason::ToolUse,
            _ => StopReason::EndTurn,
        };

        debug!(
            ?stop_reason,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "Chat completion received"
        );

        Ok(CompletionResponse {
            message,
            stop_reason,
            usage,
        })
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl WireMessage {
    fn text(role: &'static str, content: String) -> Self {
        Self {
            role,
            content: Some(content),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunction,
}

impl From<&ToolDefinition> for WireTool {
    fn from(tool: &ToolDefinition) -> Self {
        Self {
            kind: "function",
            function: WireFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.input_schema.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct WireFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: WireFunctionCall,
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

// ============================================================================
// Conversion
// ============================================================================

/// System prompt first, then each message; tool results become `tool` messages
fn to_wire_messages(system: Option<String>, messages: Vec<Message>) -> Vec<WireMessage> {
    let mut wire: Vec<WireMessage> = system
        .into_iter()
        .map(|s| WireMessage::text("system", s))
        .collect();

    for message in messages {
        let role = match message.role {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        };

        match message.content {
            Some(MessageContent::Text(text)) => wire.push(WireMessage::text(role, text)),
            Some(MessageContent::Blocks(blocks)) => push_blocks(&mut wire, role, blocks),
            None => wire.push(WireMessage::text(role, String::new())),
        }
    }

    wire
}

fn push_blocks(wire: &mut Vec<WireMessage>, role: &'static str, blocks: Vec<ContentBlock>) {
    let mut texts = Vec::new();
    let mut calls = Vec::new();
    let mut results = Vec::new();

    for block in blocks {
        match block {
            ContentBlock::Text { text } => texts.push(text),
            ContentBlock::ToolUse { id, name, input } => calls.push(WireToolCall {
                id,
                kind: function_kind(),
                function: WireFunctionCall {
                    name,
                    arguments: input.to_string(),
                },
            }),
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                ..
            } => results.push(WireMessage {
                role: "tool",
                content: Some(content),
                tool_calls: None,
                tool_call_id: Some(tool_use_id),
            }),
        }
    }

    let text = (!texts.is_empty()).then(|| texts.join("\n"));
    if !calls.is_empty() {
        wire.push(WireMessage {
            role,
            content: text,
            tool_calls: Some(calls),
            tool_call_id: None,
        });
        wire.extend(results);
    } else {
        wire.extend(results);
        if let Some(text) = text {
            wire.push(WireMessage::text(role, text));
        }
    }
}

fn from_wire_message(message: ChatResponseMessage) -> Message {
    let mut blocks = Vec::new();

    if let Some(text) = message.content.filter(|t| !t.is_empty()) {
        blocks.push(ContentBlock::Text { text });
    }

    for call in message.tool_calls {
        // Malformed arguments are passed through as a string so the tool
        // reports the problem back to the model.
        let input = serde_json::from_str(&call.function.arguments)
            .unwrap_or(Value::String(call.function.arguments));
        blocks.push(ContentBlock::ToolUse {
            id: call.id,
            name: call.function.name,
            input,
        });
    }

    Message::assistant_blocks(blocks)
}
