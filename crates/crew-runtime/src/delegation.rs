//! Delegation tools
//!
//! Agents allowed to delegate get `delegate_work` and `ask_question` for the
//! duration of a task. Both hand a fresh prompt to a coworker agent, found by
//! role, and return its answer. Coworker runs share the run budget through
//! the cloned [`Context`].

use async_trait::async_trait;
use crew_core::{Agent, Context, Error, Result};
use crew_llm::tools::schema;
use crew_tools::{Tool, parse_params};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

pub const DELEGATE_WORK: &str = "delegate_work";
pub const ASK_QUESTION: &str = "ask_question";

/// Both delegation tools for one task
pub fn delegation_tools(coworkers: Vec<Arc<dyn Agent>>, ctx: &Context) -> Vec<Arc<dyn Tool>> {
    let crew = Coworkers {
        agents: coworkers,
        ctx: ctx.clone(),
    };
    vec![
        Arc::new(DelegateWorkTool::new(crew.clone())),
        Arc::new(AskQuestionTool::new(crew)),
    ]
}

#[derive(Clone)]
struct Coworkers {
    agents: Vec<Arc<dyn Agent>>,
    ctx: Context,
}

impl Coworkers {
    fn roles(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.name()).collect()
    }

    fn find(&self, tool: &str, name: &str) -> Result<Arc<dyn Agent>> {
        let wanted = normalize(name);
        self.agents
            .iter()
            .find(|a| normalize(a.name()) == wanted)
            .cloned()
            .ok_or_else(|| {
                Error::tool(
                    tool,
                    format!(
                        "coworker '{name}' not found; choose one of: {}",
                        self.roles().join(", ")
                    ),
                )
            })
    }

    async fn ask(&self, tool: &str, coworker: &str, request: &str, context: &str) -> Result<Value> {
        let agent = self.find(tool, coworker)?;
        info!(tool, coworker = agent.name(), "Delegating to coworker");

        let prompt = format!(
            "{request}\n\nThis is the context you're working with:\n{context}\n\n\
             Begin! This is VERY important to you, your job depends on it!"
        );
        let mut ctx = self.ctx.clone();
        let answer = agent.process(prompt, &mut ctx).await?;
        Ok(Value::String(answer))
    }
}

fn normalize(role: &str) -> String {
    role.trim().trim_matches('"').to_lowercase()
}

#[derive(Debug, Deserialize)]
struct DelegateParams {
    task: String,
    #[serde(default)]
    context: String,
    coworker: String,
}

#[derive(Debug, Deserialize)]
struct QuestionParams {
    question: String,
    #[serde(default)]
    context: String,
    coworker: String,
}

/// Hands a whole piece of work to a coworker
pub struct DelegateWorkTool {
    crew: Coworkers,
    description: String,
}

impl DelegateWorkTool {
    fn new(crew: Coworkers) -> Self {
        let description = format!(
            "Delegate a specific task to one of the following coworkers: {}. \
             The input to this tool should be the coworker, the task you want them to do, \
             and ALL necessary context to execute the task, they know nothing about the \
             task, so share absolutely everything you know.",
            crew.roles().join(", ")
        );
        Self { crew, description }
    }
}

#[async_trait]
impl Tool for DelegateWorkTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let params: DelegateParams = parse_params(DELEGATE_WORK, params)?;
        self.crew
            .ask(DELEGATE_WORK, &params.coworker, &params.task, &params.context)
            .await
    }

    fn name(&self) -> &str {
        DELEGATE_WORK
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "task": schema::string("The task to delegate"),
                "context": schema::string("The context for the task"),
                "coworker": schema::string("The role of the coworker to delegate to"),
            }),
            &["task", "context", "coworker"],
        )
    }
}

/// Asks a coworker a single question
pub struct AskQuestionTool {
    crew: Coworkers,
    description: String,
}

impl AskQuestionTool {
    fn new(crew: Coworkers) -> Self {
        let description = format!(
            "Ask a specific question to one of the following coworkers: {}. \
             The input to this tool should be the coworker, the question you have for them, \
             and ALL necessary context to ask the question properly, they know nothing about \
             the question, so share absolutely everything you know.",
            crew.roles().join(", ")
        );
        Self { crew, description }
    }
}

#[async_trait]
impl Tool for AskQuestionTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let params: QuestionParams = parse_params(ASK_QUESTION, params)?;
        self.crew
            .ask(ASK_QUESTION, &params.coworker, &params.question, &params.context)
            .await
    }

    fn name(&self) -> &str {
        ASK_QUESTION
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "question": schema::string("The question to ask"),
                "context": schema::string("The context for the question"),
                "coworker": schema::string("The role of the coworker to ask"),
            }),
            &["question", "context", "coworker"],
        )
    }
}
