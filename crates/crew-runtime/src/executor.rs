//! Agent executor for running agent loops
//!
//! The AgentExecutor implements the core agent loop pattern:
//! 1. Take one unit from the run budget and call the LLM
//! 2. If tool use was requested, execute the tools and loop back
//! 3. Otherwise hand the answer to the output guard
//! 4. Return on acceptance, loop with feedback on retry
//!
//! The loop is bounded twice: by the agent's own `max_iterations` and by the
//! crew-wide [`crew_core::IterationBudget`] carried in the context.

use crate::guard::{GuardVerdict, OutputGuard};
use crew_core::{BudgetScope, Context, Error, Result};
use crew_llm::{CompletionRequest, LLMProvider, Message, StopReason, TokenUsage};
use crew_tools::{Tool, ToolRegistry};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

const EMPTY_ANSWER_FEEDBACK: &str =
    "Your last answer was empty. Reply with your final answer as plain text.";

/// Configuration for agent execution
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Name used in logs and budget errors (the agent role)
    pub agent_name: String,

    /// The agent's own iteration ceiling
    pub max_iterations: usize,

    pub model: String,

    pub system_prompt: Option<String>,

    /// Max tokens per completion
    pub max_tokens: usize,

    pub temperature: Option<f32>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            agent_name: "agent".to_string(),
            max_iterations: 10,
            model: "gpt-3.5-turbo".to_string(),
            system_prompt: None,
            max_tokens: 4096,
            temperature: Some(0.7),
        }
    }
}

/// One tool call made during a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub name: String,
    pub input: Value,
    /// Error text handed back to the model, if the call failed
    pub error: Option<String>,
}

impl ToolInvocation {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-run options
#[derive(Default, Clone)]
pub struct RunOptions {
    /// Tools available for this run only (e.g. delegation)
    pub extra_tools: Vec<Arc<dyn Tool>>,
    pub guard: Option<Arc<dyn OutputGuard>>,
}

impl RunOptions {
    pub fn with_tools(mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        self.extra_tools.extend(tools);
        self
    }

    pub fn with_guard(mut self, guard: Arc<dyn OutputGuard>) -> Self {
        self.guard = Some(guard);
        self
    }
}

impl std::fmt::Debug for RunOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunOptions")
            .field(
                "extra_tools",
                &self.extra_tools.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .field("guard", &self.guard.is_some())
            .finish()
    }
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    /// Final answer text
    pub output: String,
    /// LLM calls made by this run (coworker runs not included)
    pub iterations: usize,
    pub tool_calls: Vec<ToolInvocation>,
    /// Structured form produced by the guard
    pub structured: Option<Value>,
    pub usage: TokenUsage,
}

/// Executes an agent loop: LLM → tool calls → execution → loop back
pub struct AgentExecutor {
    provider: Arc<dyn LLMProvider>,
    tool_registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
}

impl AgentExecutor {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        tool_registry: Arc<ToolRegistry>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            provider,
            tool_registry,
            config,
        }
    }

    pub fn builder() -> AgentExecutorBuilder {
        AgentExecutorBuilder::new()
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run the loop for a single task prompt
    ///
    /// Returns [`Error::BudgetExceeded`] with [`BudgetScope::Agent`] when the
    /// agent's own ceiling is reached and with [`BudgetScope::Crew`] when the
    /// run budget in `ctx` runs out. Tool failures never end the loop; they
    /// are returned to the model as error results.
    pub async fn run(
        &self,
        prompt: &str,
        ctx: &Context,
        options: RunOptions,
    ) -> Result<ExecutionOutcome> {
        let registry = if options.extra_tools.is_empty() {
            Arc::clone(&self.tool_registry)
        } else {
            Arc::new(ToolRegistry::from_tools(
                self.tool_registry
                    .list_tools()
                    .into_iter()
                    .chain(options.extra_tools.iter().cloned()),
            ))
        };
        let tools = registry.definitions();
        let agent = self.config.agent_name.as_str();

        let mut conversation = vec![Message::user(prompt)];
        let mut calls: Vec<ToolInvocation> = Vec::new();
        let mut usage = TokenUsage::default();

        for iteration in 1..=self.config.max_iterations {
            ctx.budget().try_consume()?;

            info!(
                agent,
                iteration,
                max_iterations = self.config.max_iterations,
                budget_remaining = ctx.budget().remaining(),
                "Agent iteration started"
            );

            let mut request = CompletionRequest::builder(&self.config.model)
                .messages(conversation.clone())
                .max_tokens(self.config.max_tokens)
                .tools(tools.clone());
            if let Some(system) = &self.config.system_prompt {
                request = request.system(system);
            }
            if let Some(temperature) = self.config.temperature {
                request = request.temperature(temperature);
            }

            let response = self.provider.complete(request.build()).await?;
            usage += response.usage;

            debug!(
                agent,
                stop_reason = ?response.stop_reason,
                input_tokens = response.usage.input_tokens,
                output_tokens = response.usage.output_tokens,
                "LLM response received"
            );

            conversation.push(response.message.clone());

            if response.message.has_tool_uses() {
                let results = self
                    .execute_tools(&registry, &response.message, &mut calls)
                    .await?;
                conversation.push(Message::tool_results(results));
                continue;
            }

            if response.stop_reason == StopReason::MaxTokens {
                warn!(agent, "Hit max tokens in LLM response");
            }

            let output = response.message.text().unwrap_or_default();
            if output.trim().is_empty() {
                warn!(agent, iteration, "Empty answer, asking again");
                conversation.push(Message::user(EMPTY_ANSWER_FEEDBACK));
                continue;
            }

            let verdict = options
                .guard
                .as_ref()
                .map_or(GuardVerdict::Accept(None), |g| g.check(&output, &calls));

            match verdict {
                GuardVerdict::Accept(structured) => {
                    info!(
                        agent,
                        iterations = iteration,
                        tool_calls = calls.len(),
                        output_length = output.len(),
                        "Agent completed"
                    );
                    return Ok(ExecutionOutcome {
                        output,
                        iterations: iteration,
                        tool_calls: calls,
                        structured,
                        usage,
                    });
                }
                GuardVerdict::Retry(feedback) => {
                    warn!(agent, iteration, feedback = %feedback, "Output rejected, retrying");
                    conversation.push(Message::user(feedback));
                }
                GuardVerdict::Reject(error) => {
                    warn!(agent, iteration, error = %error, "Output rejected");
                    return Err(error);
                }
            }
        }

        warn!(
            agent,
            max_iterations = self.config.max_iterations,
            "Max iterations reached without an accepted answer"
        );
        Err(Error::BudgetExceeded {
            scope: BudgetScope::Agent(self.config.agent_name.clone()),
            limit: self.config.max_iterations,
        })
    }

    /// Execute tool calls from an assistant message
    ///
    /// Every requested call gets a result block. Only a crew-wide budget
    /// exhaustion inside a tool (a delegated coworker run) aborts.
    async fn execute_tools(
        &self,
        registry: &ToolRegistry,
        message: &Message,
        calls: &mut Vec<ToolInvocation>,
    ) -> Result<Vec<crew_llm::ContentBlock>> {
        let agent = self.config.agent_name.as_str();
        let mut results = Vec::new();

        for (id, name, input) in message.tool_uses() {
            let Some(tool) = registry.get(name) else {
                let error = format!(
                    "Error: unknown tool '{name}'. Available tools: {}",
                    registry.names().join(", ")
                );
                warn!(agent, tool_name = name, "Model requested an unknown tool");
                calls.push(ToolInvocation {
                    name: name.to_string(),
                    input: input.clone(),
                    error: Some(error.clone()),
                });
                results.push(Message::tool_error_block(id, error));
                continue;
            };

            info!(agent, tool_name = name, tool_id = id, "Executing tool");
            let start = Instant::now();

            match tool.execute(input.clone()).await {
                Ok(value) => {
                    let content = match value {
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    info!(
                        agent,
                        tool_name = name,
                        duration_ms = start.elapsed().as_millis() as u64,
                        result_length = content.len(),
                        "Tool execution succeeded"
                    );
                    calls.push(ToolInvocation {
                        name: name.to_string(),
                        input: input.clone(),
                        error: None,
                    });
                    results.push(Message::tool_result_block(id, content));
                }
                Err(e) if e.is_crew_budget() => return Err(e),
                Err(e) => {
                    warn!(
                        agent,
                        tool_name = name,
                        duration_ms = start.elapsed().as_millis() as u64,
                        error = %e,
                        "Tool execution failed"
                    );
                    let error = format!("Error: {e}");
                    calls.push(ToolInvocation {
                        name: name.to_string(),
                        input: input.clone(),
                        error: Some(error.clone()),
                    });
                    results.push(Message::tool_error_block(id, error));
                }
            }
        }

        Ok(results)
    }
}

/// Builder for AgentExecutor
pub struct AgentExecutorBuilder {
    provider: Option<Arc<dyn LLMProvider>>,
    tool_registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
}

impl AgentExecutorBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tool_registry: Arc::new(ToolRegistry::new()),
            config: ExecutorConfig::default(),
        }
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn tool_registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.tool_registry = registry;
        self
    }

    /// Set the full configuration
    pub fn config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn agent_name(mut self, name: impl Into<String>) -> Self {
        self.config.agent_name = name.into();
        self
    }

    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = Some(temperature);
        self
    }

    pub fn build(self) -> Result<AgentExecutor> {
        let provider = self
            .provider
            .ok_or_else(|| Error::InitializationFailed("Provider not set".to_string()))?;

        Ok(AgentExecutor::new(provider, self.tool_registry, self.config))
    }
}

impl Default for AgentExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
