//! Manager policies
//!
//! The crew asks its [`ManagerPolicy`] which ready task runs next. The
//! sequential policy follows declaration order; the LLM manager asks a model
//! to choose and pays one budget unit per decision.

use async_trait::async_trait;
use crew_core::{Context, Error, Result};
use crew_llm::{CompletionRequest, LLMProvider, Message};
use crew_prompt::PromptBuilder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

/// How tasks are scheduled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Process {
    #[default]
    Sequential,
    /// A manager LLM picks among ready tasks
    Hierarchical,
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => f.write_str("sequential"),
            Self::Hierarchical => f.write_str("hierarchical"),
        }
    }
}

impl FromStr for Process {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "hierarchical" => Ok(Self::Hierarchical),
            other => Err(Error::Config(format!(
                "unknown process '{other}', expected sequential or hierarchical"
            ))),
        }
    }
}

/// A task the manager may choose
#[derive(Debug, Clone, PartialEq)]
pub struct ReadyTask {
    pub id: String,
    pub agent: String,
    /// Rendered description
    pub description: String,
}

/// What the manager sees when deciding
#[derive(Debug, Clone, Default)]
pub struct ManagerView {
    /// In declaration order, never empty
    pub ready: Vec<ReadyTask>,
    /// Ids of tasks already complete
    pub completed: Vec<String>,
}

impl ManagerView {
    pub fn first_ready(&self) -> Result<&ReadyTask> {
        self.ready
            .first()
            .ok_or_else(|| Error::ProcessingFailed("no task is ready to run".to_string()))
    }
}

/// Picks the next task among those whose dependencies are complete
#[async_trait]
pub trait ManagerPolicy: Send + Sync {
    fn name(&self) -> &str;

    /// Returns the id of the chosen task
    async fn select(&self, view: &ManagerView, ctx: &Context) -> Result<String>;
}

/// First ready task in declaration order
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialPolicy;

#[async_trait]
impl ManagerPolicy for SequentialPolicy {
    fn name(&self) -> &str {
        "sequential"
    }

    async fn select(&self, view: &ManagerView, _ctx: &Context) -> Result<String> {
        Ok(view.first_ready()?.id.clone())
    }
}

const MANAGER_SYSTEM_PROMPT: &str = "You are the Crew Manager. You coordinate a team of \
analysts and decide which task should be worked on next so the team produces the best \
possible final report.";

/// Lets a manager model choose the next task
pub struct LlmManagerPolicy {
    provider: Arc<dyn LLMProvider>,
    model: String,
    temperature: Option<f32>,
}

impl LlmManagerPolicy {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: Some(0.0),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    fn prompt(view: &ManagerView, ctx: &Context) -> String {
        PromptBuilder::new()
            .when(
                ctx.ticker().is_some(),
                format!("The team is analysing {}.\n", ctx.ticker().unwrap_or_default()),
            )
            .section("Completed tasks")
            .when(view.completed.is_empty(), "- none\n")
            .bullets(view.completed.iter().cloned())
            .section("Tasks ready to run")
            .bullets(
                view.ready
                    .iter()
                    .map(|t| format!("{} (agent: {}): {}", t.id, t.agent, t.description)),
            )
            .blank_line()
            .text("Reply with only the id of the task to run next.")
            .build_trimmed()
    }

    /// Exact id first, then the earliest id mentioned in the answer
    fn parse_choice(answer: &str, view: &ManagerView) -> Option<String> {
        let answer = answer.trim().trim_matches(|c: char| c == '"' || c == '\'' || c == '`');
        if let Some(task) = view.ready.iter().find(|t| t.id.eq_ignore_ascii_case(answer)) {
            return Some(task.id.clone());
        }

        let lower = answer.to_lowercase();
        view.ready
            .iter()
            .filter_map(|t| lower.find(&t.id.to_lowercase()).map(|pos| (pos, t)))
            .min_by_key(|(pos, _)| *pos)
            .map(|(_, t)| t.id.clone())
    }
}

#[async_trait]
impl ManagerPolicy for LlmManagerPolicy {
    fn name(&self) -> &str {
        "llm_manager"
    }

    async fn select(&self, view: &ManagerView, ctx: &Context) -> Result<String> {
        let fallback = view.first_ready()?.id.clone();
        if view.ready.len() == 1 {
            return Ok(fallback);
        }

        ctx.budget().try_consume()?;

        let mut request = CompletionRequest::builder(&self.model)
            .system(MANAGER_SYSTEM_PROMPT)
            .add_message(Message::user(Self::prompt(view, ctx)))
            .max_tokens(64);
        if let Some(temperature) = self.temperature {
            request = request.temperature(temperature);
        }

        let response = self.provider.complete(request.build()).await?;
        let answer = response.message.text().unwrap_or_default();
        debug!(answer = %answer, "Manager answered");

        Ok(Self::parse_choice(&answer, view).unwrap_or_else(|| {
            warn!(answer = %answer, fallback = %fallback, "Unusable manager answer, using first ready task");
            fallback
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crew_core::IterationBudget;
    use crew_llm::testing::{ScriptedProvider, reply};

    fn view(ids: &[&str]) -> ManagerView {
        ManagerView {
            ready: ids
                .iter()
                .map(|id| ReadyTask {
                    id: (*id).to_string(),
                    agent: "Analyst".to_string(),
                    description: format!("{id} description"),
                })
                .collect(),
            completed: vec![],
        }
    }

    #[test]
    fn test_process_parse_and_display() {
        assert_eq!("Hierarchical".parse::<Process>().unwrap(), Process::Hierarchical);
        assert_eq!(" sequential ".parse::<Process>().unwrap(), Process::Sequential);
        assert!(matches!("parallel".parse::<Process>(), Err(Error::Config(_))));
        assert_eq!(Process::Hierarchical.to_string(), "hierarchical");
    }

    #[tokio::test]
    async fn test_sequential_picks_first_ready() {
        let ctx = Context::new().with_budget(IterationBudget::new(1));
        let choice = SequentialPolicy.select(&view(&["price", "news"]), &ctx).await.unwrap();
        assert_eq!(choice, "price");
        assert_eq!(ctx.budget().used(), 0);

        assert!(SequentialPolicy.select(&view(&[]), &ctx).await.is_err());
    }

    #[tokio::test]
    async fn test_llm_manager_choice_costs_one_iteration() {
        let provider = Arc::new(ScriptedProvider::new(vec![reply::text("news")]));
        let policy = LlmManagerPolicy::new(provider.clone(), "gpt-4o");
        let ctx = Context::new()
            .with_ticker("AAPL")
            .with_budget(IterationBudget::new(15));

        let choice = policy.select(&view(&["price", "news"]), &ctx).await.unwrap();

        assert_eq!(choice, "news");
        assert_eq!(ctx.budget().used(), 1);
        let request = &provider.requests()[0];
        let prompt = request.messages[0].text().unwrap();
        assert!(prompt.contains("analysing AAPL"));
        assert!(prompt.contains("- price (agent: Analyst): price description"));
    }

    #[tokio::test]
    async fn test_llm_manager_single_ready_task_is_free() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let policy = LlmManagerPolicy::new(provider.clone(), "gpt-4o");
        let ctx = Context::new().with_budget(IterationBudget::new(15));

        assert_eq!(policy.select(&view(&["write"]), &ctx).await.unwrap(), "write");
        assert_eq!(provider.call_count(), 0);
        assert_eq!(ctx.budget().used(), 0);
    }

    #[tokio::test]
    async fn test_llm_manager_falls_back_on_unusable_answer() {
        let provider = Arc::new(ScriptedProvider::new(vec![reply::text("the writer, obviously")]));
        let policy = LlmManagerPolicy::new(provider, "gpt-4o");

        let choice = policy
            .select(&view(&["price", "news"]), &Context::new())
            .await
            .unwrap();
        assert_eq!(choice, "price");
    }

    #[tokio::test]
    async fn test_llm_manager_respects_budget() {
        let provider = Arc::new(ScriptedProvider::new(vec![reply::text("news")]));
        let policy = LlmManagerPolicy::new(provider.clone(), "gpt-4o");
        let ctx = Context::new().with_budget(IterationBudget::new(0));

        let err = policy.select(&view(&["price", "news"]), &ctx).await.unwrap_err();
        assert!(err.is_crew_budget());
        assert_eq!(provider.call_count(), 0);
    }

    #[test]
    fn test_parse_choice() {
        let v = view(&["price", "news"]);
        assert_eq!(LlmManagerPolicy::parse_choice("`NEWS`", &v).as_deref(), Some("news"));
        assert_eq!(
            LlmManagerPolicy::parse_choice("Run news first, then price.", &v).as_deref(),
            Some("news")
        );
        assert_eq!(LlmManagerPolicy::parse_choice("nothing", &v), None);
    }
}
