//! Crew agent persona
//!
//! A [`CrewAgent`] is a role, a goal and a backstory bound to an LLM, a tool
//! set and its own iteration ceiling. The goal and backstory may reference
//! run inputs (`{{ ticker }}`), rendered when a task starts.

use crate::executor::{AgentExecutor, ExecutionOutcome, ExecutorConfig, RunOptions};
use async_trait::async_trait;
use crew_core::{Agent, Context, Error, Result};
use crew_llm::LLMProvider;
use crew_prompt::{JinjaTemplate, PromptTemplate};
use crew_tools::{Tool, ToolRegistry};
use std::sync::Arc;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_MAX_ITER: usize = 10;

/// An LLM-backed crew member
pub struct CrewAgent {
    role: String,
    goal: JinjaTemplate,
    backstory: JinjaTemplate,
    max_iter: usize,
    allow_delegation: bool,
    tools: Arc<ToolRegistry>,
    provider: Arc<dyn LLMProvider>,
    model: String,
    temperature: Option<f32>,
    max_tokens: usize,
}

impl CrewAgent {
    pub fn builder(role: impl Into<String>) -> CrewAgentBuilder {
        CrewAgentBuilder::new(role)
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    pub fn allow_delegation(&self) -> bool {
        self.allow_delegation
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.names()
    }

    /// System prompt for a run with the given inputs
    pub fn system_prompt(&self, ctx: &Context) -> Result<String> {
        let vars = ctx.template_vars();
        let goal = self.goal.render(&vars)?;
        let backstory = self.backstory.render(&vars)?;
        Ok(format!(
            "You are {}. {}\nYour personal goal is: {}",
            self.role, backstory, goal
        ))
    }

    /// Run one task prompt through this agent's loop
    pub async fn execute_task(
        &self,
        prompt: &str,
        ctx: &Context,
        options: RunOptions,
    ) -> Result<ExecutionOutcome> {
        let config = ExecutorConfig {
            agent_name: self.role.clone(),
            max_iterations: self.max_iter,
            model: self.model.clone(),
            system_prompt: Some(self.system_prompt(ctx)?),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };
        AgentExecutor::new(Arc::clone(&self.provider), Arc::clone(&self.tools), config)
            .run(prompt, ctx, options)
            .await
    }
}

impl std::fmt::Debug for CrewAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrewAgent")
            .field("role", &self.role)
            .field("max_iter", &self.max_iter)
            .field("allow_delegation", &self.allow_delegation)
            .field("tools", &self.tools.names())
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

/// Delegated work arrives here: a fresh conversation, no delegation tools.
#[async_trait]
impl Agent for CrewAgent {
    async fn process(&self, input: String, context: &mut Context) -> Result<String> {
        self.execute_task(&input, context, RunOptions::default())
            .await
            .map(|outcome| outcome.output)
    }

    fn name(&self) -> &str {
        &self.role
    }
}

/// Builder for [`CrewAgent`]
pub struct CrewAgentBuilder {
    role: String,
    goal: String,
    backstory: String,
    max_iter: usize,
    allow_delegation: bool,
    tools: Vec<Arc<dyn Tool>>,
    provider: Option<Arc<dyn LLMProvider>>,
    model: String,
    temperature: Option<f32>,
    max_tokens: usize,
}

impl CrewAgentBuilder {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            goal: String::new(),
            backstory: String::new(),
            max_iter: DEFAULT_MAX_ITER,
            allow_delegation: false,
            tools: Vec::new(),
            provider: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: None,
            max_tokens: 4096,
        }
    }

    pub fn goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = goal.into();
        self
    }

    pub fn backstory(mut self, backstory: impl Into<String>) -> Self {
        self.backstory = backstory.into();
        self
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn allow_delegation(mut self, allow: bool) -> Self {
        self.allow_delegation = allow;
        self
    }

    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn build(self) -> Result<CrewAgent> {
        if self.role.trim().is_empty() {
            return Err(Error::Config("agent role must not be empty".to_string()));
        }
        if self.max_iter == 0 {
            return Err(Error::Config(format!(
                "agent '{}' needs max_iter >= 1",
                self.role
            )));
        }
        let provider = self.provider.ok_or_else(|| {
            Error::InitializationFailed(format!("agent '{}' has no LLM provider", self.role))
        })?;

        Ok(CrewAgent {
            goal: JinjaTemplate::new(format!("{} goal", self.role), self.goal)?,
            backstory: JinjaTemplate::new(format!("{} backstory", self.role), self.backstory)?,
            role: self.role,
            max_iter: self.max_iter,
            allow_delegation: self.allow_delegation,
            tools: Arc::new(ToolRegistry::from_tools(self.tools)),
            provider,
            model: self.model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        })
    }
}
