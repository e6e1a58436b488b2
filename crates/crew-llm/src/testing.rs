//! Scripted provider for tests
//!
//! Enabled with the `testing` feature. Downstream crates use it to drive
//! agents and crews through fixed conversations without a network.

use crate::{
    CompletionRequest, CompletionResponse, ContentBlock, LLMError, LLMProvider, Message, Result,
    StopReason, TokenUsage,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

type Responder = Box<dyn Fn(&CompletionRequest) -> Result<CompletionResponse> + Send + Sync>;

enum Script {
    Queue(Mutex<VecDeque<Result<CompletionResponse>>>),
    Responder(Responder),
}

/// Provider that replays canned responses and records every request
pub struct ScriptedProvider {
    script: Script,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    /// Replay `responses` in order; fails once they run out
    pub fn new(responses: impl IntoIterator<Item = CompletionResponse>) -> Self {
        Self::from_results(responses.into_iter().map(Ok))
    }

    /// Replay a mix of responses and errors in order
    pub fn from_results(results: impl IntoIterator<Item = Result<CompletionResponse>>) -> Self {
        Self {
            script: Script::Queue(Mutex::new(results.into_iter().collect())),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer each request with a function of the request
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&CompletionRequest) -> Result<CompletionResponse> + Send + Sync + 'static,
    {
        Self {
            script: Script::Responder(Box::new(responder)),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let response = match &self.script {
            Script::Queue(queue) => queue
                .lock()
                .map_err(|_| LLMError::RequestFailed("script lock poisoned".to_string()))?
                .pop_front()
                .unwrap_or_else(|| {
                    Err(LLMError::UnexpectedResponse("script exhausted".to_string()))
                }),
            Script::Responder(responder) => responder(&request),
        };

        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        response
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Builders for canned responses
pub mod reply {
    use super::{CompletionResponse, ContentBlock, Message, StopReason, TokenUsage, Value};

    /// A final text answer
    pub fn text(text: impl Into<String>) -> CompletionResponse {
        CompletionResponse {
            message: Message::assistant_blocks(vec![ContentBlock::Text { text: text.into() }]),
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage {
                input_tokens: 10,
                output_tokens: 10,
            },
        }
    }

    /// A single tool call
    pub fn tool_call(id: &str, name: &str, input: Value) -> CompletionResponse {
        tool_calls(&[(id, name, input)])
    }

    /// Several tool calls in one turn
    pub fn tool_calls(calls: &[(&str, &str, Value)]) -> CompletionResponse {
        let blocks = calls
            .iter()
            .map(|(id, name, input)| ContentBlock::ToolUse {
                id: (*id).to_string(),
                name: (*name).to_string(),
                input: input.clone(),
            })
            .collect();
        CompletionResponse {
            message: Message::assistant_blocks(blocks),
            stop_reason: StopReason::ToolUse,
            usage: TokenUsage {
                input_tokens: 10,
                output_tokens: 5,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_queue_replays_in_order() {
        let provider = ScriptedProvider::new(vec![
            reply::tool_call("c1", "market_data", json!({"ticker": "AAPL"})),
            reply::text("AAPL, price up"),
        ]);

        let first = provider
            .complete(CompletionRequest::builder("m").build())
            .await
            .unwrap();
        assert_eq!(first.stop_reason, StopReason::ToolUse);

        let second = provider
            .complete(CompletionRequest::builder("m").build())
            .await
            .unwrap();
        assert_eq!(second.message.text().as_deref(), Some("AAPL, price up"));

        tokio_test::assert_err!(
            provider
                .complete(CompletionRequest::builder("m").build())
                .await
        );
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_responder_sees_request() {
        let provider = ScriptedProvider::from_fn(|req| Ok(reply::text(req.model.clone())));
        let out = provider
            .complete(CompletionRequest::builder("gpt-3.5-turbo").build())
            .await
            .unwrap();
        assert_eq!(out.message.text().as_deref(), Some("gpt-3.5-turbo"));
    }
}
