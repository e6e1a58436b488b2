//! Task definition
//!
//! A task pairs a templated description and expected output with the agent
//! that performs it and the ids of the tasks whose outputs it needs.

use crew_core::{Error, Result};
use crew_prompt::{JinjaTemplate, PromptTemplate};
use crew_runtime::{CrewAgent, OutputGuard};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Lifecycle of a task within one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Pending,
    Running,
    Complete,
    Failed,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Complete => "complete",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A unit of work assigned to one agent
pub struct Task {
    id: String,
    description: JinjaTemplate,
    expected_output: JinjaTemplate,
    agent: Arc<CrewAgent>,
    context: Vec<String>,
    guard: Option<Arc<dyn OutputGuard>>,
}

impl Task {
    pub fn builder(id: impl Into<String>) -> TaskBuilder {
        TaskBuilder::new(id)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn agent(&self) -> &Arc<CrewAgent> {
        &self.agent
    }

    /// Ids of the tasks whose outputs this task receives
    pub fn context(&self) -> &[String] {
        &self.context
    }

    pub fn guard(&self) -> Option<Arc<dyn OutputGuard>> {
        self.guard.clone()
    }

    pub fn render_description(&self, vars: &Value) -> Result<String> {
        Ok(self.description.render(vars)?)
    }

    pub fn render_expected_output(&self, vars: &Value) -> Result<String> {
        Ok(self.expected_output.render(vars)?)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("agent", &self.agent.role())
            .field("context", &self.context)
            .field("guarded", &self.guard.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Task`]
pub struct TaskBuilder {
    id: String,
    description: String,
    expected_output: String,
    agent: Option<Arc<CrewAgent>>,
    context: Vec<String>,
    guard: Option<Arc<dyn OutputGuard>>,
}

impl TaskBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            expected_output: String::new(),
            agent: None,
            context: Vec::new(),
            guard: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn expected_output(mut self, expected_output: impl Into<String>) -> Self {
        self.expected_output = expected_output.into();
        self
    }

    pub fn agent(mut self, agent: Arc<CrewAgent>) -> Self {
        self.agent = Some(agent);
        self
    }

    /// Add a task whose output this task needs
    pub fn context(mut self, task_id: impl Into<String>) -> Self {
        self.context.push(task_id.into());
        self
    }

    pub fn guard(mut self, guard: Arc<dyn OutputGuard>) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn build(self) -> Result<Task> {
        if self.id.trim().is_empty() {
            return Err(Error::Config("task id must not be empty".to_string()));
        }
        if self.description.trim().is_empty() {
            return Err(Error::Config(format!(
                "task '{}' has no description",
                self.id
            )));
        }
        let agent = self
            .agent
            .ok_or_else(|| Error::Config(format!("task '{}' has no agent", self.id)))?;

        Ok(Task {
            description: JinjaTemplate::new(format!("{} description", self.id), self.description)?,
            expected_output: JinjaTemplate::new(
                format!("{} expected output", self.id),
                self.expected_output,
            )?,
            id: self.id,
            agent,
            context: self.context,
            guard: self.guard,
        })
    }
}
