//! LLM provider abstraction layer for stock-crew
//!
//! This crate provides provider-agnostic abstractions for interacting with
//! Large Language Models (LLMs). It includes:
//!
//! - Message types for LLM communication
//! - Completion request/response types
//! - Tool definitions for function calling
//! - Provider trait for LLM implementations
//! - An OpenAI-compatible provider (behind the `openai` feature)

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;
pub mod providers;
pub mod tools;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export main types
pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use messages::{ContentBlock, Message, MessageContent, Role};
pub use provider::LLMProvider;
pub use tools::ToolDefinition;
