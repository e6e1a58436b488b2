//! Crew: the run loop over a task graph
//!
//! One task runs at a time. Each step the policy picks among the ready
//! tasks, the task's agent runs with the outputs of its context tasks, and
//! the result moves the task to Complete or Failed. A failure or an
//! exhausted budget ends the run; whatever completed so far is returned.

use crate::graph::TaskGraph;
use crate::output::{CrewOutput, RunStatus, TaskOutput, TaskRecord};
use crate::policy::{LlmManagerPolicy, ManagerPolicy, ManagerView, Process, ReadyTask, SequentialPolicy};
use crate::task::{Task, TaskState};
use crew_core::{Agent, Context, Error, IterationBudget, Result};
use crew_llm::LLMProvider;
use crew_prompt::PromptBuilder;
use crew_runtime::{RunOptions, delegation_tools};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub const DEFAULT_MAX_ITERATIONS: usize = 15;

const BEGIN: &str = "Begin! This is VERY important to you, use the tools available and give \
your best Final Answer, your job depends on it!";

/// Run-level settings
#[derive(Debug, Clone)]
pub struct CrewConfig {
    pub process: Process,
    /// Ceiling on LLM calls across all agents and the manager
    pub max_iterations: usize,
}

impl Default for CrewConfig {
    fn default() -> Self {
        Self {
            process: Process::Sequential,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// A set of tasks, their agents and a scheduling policy
pub struct Crew {
    graph: TaskGraph,
    policy: Arc<dyn ManagerPolicy>,
    config: CrewConfig,
}

impl Crew {
    pub fn builder() -> CrewBuilder {
        CrewBuilder::default()
    }

    pub fn config(&self) -> &CrewConfig {
        &self.config
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    /// Run every task once
    ///
    /// `inputs` supplies the template variables (`ticker`, `current_date`).
    /// A fresh budget of `max_iterations` is attached to it. Returns `Err`
    /// only when a template cannot be rendered with the inputs, before any
    /// task runs; task failures and budget exhaustion come back as a partial
    /// [`CrewOutput`].
    #[instrument(skip_all, fields(process = %self.config.process, ticker = inputs.ticker().unwrap_or_default()))]
    pub async fn kickoff(&self, inputs: Context) -> Result<CrewOutput> {
        let ctx = inputs.with_budget(IterationBudget::new(self.config.max_iterations));
        let vars = ctx.template_vars();
        let prepared = self.prepare(&ctx, &vars)?;

        let tasks = self.graph.tasks();
        let mut states = vec![TaskState::Pending; tasks.len()];
        let mut records: Vec<TaskRecord> = tasks
            .iter()
            .map(|t| TaskRecord::pending(t.id(), t.agent().role()))
            .collect();
        let mut outputs: Vec<Option<TaskOutput>> = vec![None; tasks.len()];

        info!(
            tasks = tasks.len(),
            max_iterations = self.config.max_iterations,
            policy = self.policy.name(),
            "Crew kickoff"
        );

        let status = loop {
            let ready = self.graph.ready(&states);
            if ready.is_empty() {
                break RunStatus::Completed;
            }

            let view = ManagerView {
                ready: ready
                    .iter()
                    .map(|&i| ReadyTask {
                        id: tasks[i].id().to_string(),
                        agent: tasks[i].agent().role().to_string(),
                        description: prepared[i].description.clone(),
                    })
                    .collect(),
                completed: (0..tasks.len())
                    .filter(|&i| states[i] == TaskState::Complete)
                    .map(|i| tasks[i].id().to_string())
                    .collect(),
            };

            let selected = match self.policy.select(&view, &ctx).await {
                Ok(id) => id,
                Err(e) if e.is_budget_exceeded() => {
                    warn!(error = %e, "Budget exhausted while choosing the next task");
                    break RunStatus::BudgetExceeded;
                }
                Err(e) => break RunStatus::Failed(format!("manager failed: {e}")),
            };
            let index = ready
                .iter()
                .copied()
                .find(|&i| tasks[i].id() == selected)
                .unwrap_or_else(|| {
                    warn!(selected = %selected, "Policy chose a task that is not ready");
                    ready[0]
                });
            info!(policy = self.policy.name(), selected = tasks[index].id(), "Manager decision");

            let task = &tasks[index];
            states[index] = TaskState::Running;
            records[index].state = TaskState::Running;
            info!(task = task.id(), agent = task.agent().role(), state = %TaskState::Running, "Task transition");

            let prompt = self.task_prompt(index, &prepared[index], &outputs);
            let options = self.run_options(task, &ctx);
            let used_before = ctx.budget().used();
            let result = task.agent().execute_task(&prompt, &ctx, options).await;
            records[index].iterations = ctx.budget().used() - used_before;

            match result {
                Ok(outcome) => {
                    let output = TaskOutput {
                        task: task.id().to_string(),
                        agent: task.agent().role().to_string(),
                        raw: outcome.output,
                        structured: outcome.structured,
                    };
                    states[index] = TaskState::Complete;
                    records[index].state = TaskState::Complete;
                    records[index].output = Some(output.clone());
                    records[index].tool_calls = outcome.tool_calls;
                    outputs[index] = Some(output);
                    info!(task = task.id(), agent = task.agent().role(), state = %TaskState::Complete, "Task transition");
                }
                Err(e) => {
                    states[index] = TaskState::Failed;
                    records[index].state = TaskState::Failed;
                    records[index].error = Some(e.to_string());
                    warn!(task = task.id(), agent = task.agent().role(), state = %TaskState::Failed, error = %e, "Task transition");

                    for dependent in self.graph.dependents(index) {
                        records[dependent].blocked = true;
                        info!(task = tasks[dependent].id(), blocked_by = task.id(), "Task blocked");
                    }

                    break if e.is_budget_exceeded() {
                        RunStatus::BudgetExceeded
                    } else {
                        RunStatus::Failed(format!("task '{}' failed: {e}", task.id()))
                    };
                }
            }
        };

        let final_output = match status {
            RunStatus::Completed => self
                .graph
                .order()
                .last()
                .and_then(|&i| outputs[i].clone()),
            _ => None,
        };

        info!(
            status = ?status,
            iterations_used = ctx.budget().used(),
            "Crew finished"
        );

        Ok(CrewOutput {
            ticker: ctx.ticker().map(str::to_string),
            run_date: ctx.current_date().map(str::to_string),
            process: self.config.process,
            status,
            tasks: records,
            final_output,
            iterations_used: ctx.budget().used(),
        })
    }

    /// Render every template up front so bad inputs fail before any LLM call
    fn prepare(&self, ctx: &Context, vars: &Value) -> Result<Vec<Prepared>> {
        self.graph
            .tasks()
            .iter()
            .map(|task| {
                let invalid = |e: Error| Error::Config(format!("task '{}': {e}", task.id()));
                task.agent().system_prompt(ctx).map_err(invalid)?;
                Ok(Prepared {
                    description: task.render_description(vars).map_err(invalid)?,
                    expected_output: task.render_expected_output(vars).map_err(invalid)?,
                })
            })
            .collect()
    }

    fn task_prompt(&self, index: usize, prepared: &Prepared, outputs: &[Option<TaskOutput>]) -> String {
        let context: Vec<&str> = self
            .graph
            .dependencies(index)
            .iter()
            .filter_map(|&d| outputs[d].as_ref().map(|o| o.raw.as_str()))
            .collect();

        PromptBuilder::new()
            .text(&prepared.description)
            .when(
                !prepared.expected_output.trim().is_empty(),
                format!(
                    "\n\nThis is the expected criteria for your final answer: {}\n\
                     you MUST return the actual complete content as the final answer, not a summary.",
                    prepared.expected_output
                ),
            )
            .when(
                !context.is_empty(),
                format!(
                    "\n\nThis is the context you're working with:\n{}",
                    context.join("\n\n")
                ),
            )
            .blank_line()
            .text(BEGIN)
            .build()
    }

    fn run_options(&self, task: &Task, ctx: &Context) -> RunOptions {
        let mut options = RunOptions::default();
        if let Some(guard) = task.guard() {
            options = options.with_guard(guard);
        }
        if task.agent().allow_delegation() {
            let mut coworkers: Vec<Arc<dyn Agent>> = Vec::new();
            for other in self.graph.tasks() {
                let agent = other.agent();
                let is_self = agent.role() == task.agent().role();
                let seen = coworkers.iter().any(|c| c.name() == agent.role());
                if !is_self && !seen {
                    coworkers.push(Arc::clone(agent) as Arc<dyn Agent>);
                }
            }
            if !coworkers.is_empty() {
                options = options.with_tools(delegation_tools(coworkers, ctx));
            }
        }
        options
    }
}

impl std::fmt::Debug for Crew {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crew")
            .field("tasks", &self.graph.topological_ids())
            .field("policy", &self.policy.name())
            .field("config", &self.config)
            .finish()
    }
}

struct Prepared {
    description: String,
    expected_output: String,
}

/// Builder for [`Crew`]
#[derive(Default)]
pub struct CrewBuilder {
    tasks: Vec<Task>,
    policy: Option<Arc<dyn ManagerPolicy>>,
    config: CrewConfig,
}

impl CrewBuilder {
    pub fn task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn process(mut self, process: Process) -> Self {
        self.config.process = process;
        self
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Use a custom scheduling policy
    pub fn manager_policy(mut self, policy: Arc<dyn ManagerPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Hierarchical scheduling through a manager model
    pub fn manager_llm(self, provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        self.manager_policy(Arc::new(LlmManagerPolicy::new(provider, model)))
    }

    pub fn build(self) -> Result<Crew> {
        if self.config.max_iterations == 0 {
            return Err(Error::Config("max_iterations must be at least 1".to_string()));
        }

        let policy: Arc<dyn ManagerPolicy> = match (self.config.process, self.policy) {
            (_, Some(policy)) => policy,
            (Process::Sequential, None) => Arc::new(SequentialPolicy),
            (Process::Hierarchical, None) => {
                return Err(Error::Config(
                    "hierarchical process needs a manager policy".to_string(),
                ));
            }
        };

        Ok(Crew {
            graph: TaskGraph::new(self.tasks)?,
            policy,
            config: self.config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crew_core::BudgetScope;
    use crew_llm::testing::{ScriptedProvider, reply};
    use crew_runtime::{CrewAgent, GuardVerdict, OutputGuard, ToolInvocation};
    use serde_json::json;

    fn agent(role: &str, provider: Arc<ScriptedProvider>) -> Arc<CrewAgent> {
        Arc::new(
            CrewAgent::builder(role)
                .goal("Cover {{ ticker }}")
                .backstory("Veteran.")
                .max_iter(3)
                .provider(provider)
                .build()
                .unwrap(),
        )
    }

    fn answering(text: &'static str) -> Arc<ScriptedProvider> {
        Arc::new(ScriptedProvider::from_fn(move |_| Ok(reply::text(text))))
    }

    fn task(id: &str, agent: Arc<CrewAgent>, context: &[&str]) -> Task {
        context
            .iter()
            .fold(
                Task::builder(id)
                    .description(format!("{id} for {{{{ ticker }}}}"))
                    .expected_output("a short answer")
                    .agent(agent),
                |b, dep| b.context(*dep),
            )
            .build()
            .unwrap()
    }

    fn inputs() -> Context {
        Context::new()
            .with_ticker("AAPL")
            .with_current_date("2025-06-02")
    }

    struct Pipeline {
        price: Arc<ScriptedProvider>,
        news: Arc<ScriptedProvider>,
        writer: Arc<ScriptedProvider>,
        builder: CrewBuilder,
    }

    fn pipeline(price: Arc<ScriptedProvider>, news: Arc<ScriptedProvider>, writer: Arc<ScriptedProvider>) -> Pipeline {
        let builder = Crew::builder()
            .task(task("write", agent("Writer", writer.clone()), &["price", "news"]))
            .task(task("price", agent("Price Analyst", price.clone()), &[]))
            .task(task("news", agent("News Analyst", news.clone()), &[]));
        Pipeline {
            price,
            news,
            writer,
            builder,
        }
    }

    #[tokio::test]
    async fn test_sequential_run_respects_dependencies() {
        let p = pipeline(
            answering("AAPL, price up"),
            answering("BTC greed"),
            answering("# Report"),
        );
        let crew = p.builder.build().unwrap();

        let out = crew.kickoff(inputs()).await.unwrap();

        assert_eq!(out.status, RunStatus::Completed);
        assert_eq!(out.final_text(), Some("# Report"));
        assert_eq!(out.iterations_used, 3);
        assert_eq!(out.ticker.as_deref(), Some("AAPL"));
        assert_eq!(out.run_date.as_deref(), Some("2025-06-02"));
        assert!(out.tasks.iter().all(|t| t.state == TaskState::Complete));
        assert_eq!(out.task("write").unwrap().iterations, 1);

        let prompt = p.writer.requests()[0].messages[0].text().unwrap();
        assert!(prompt.starts_with("write for AAPL"));
        assert!(prompt.contains("This is the expected criteria for your final answer: a short answer"));
        assert!(prompt.contains("This is the context you're working with:\nAAPL, price up\n\nBTC greed"));
        assert!(prompt.ends_with("your job depends on it!"));

        let price_prompt = p.price.requests()[0].messages[0].text().unwrap();
        assert!(!price_prompt.contains("context you're working with"));
        assert_eq!(p.news.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failure_blocks_dependents() {
        let p = pipeline(
            Arc::new(ScriptedProvider::new(vec![])),
            answering("BTC greed"),
            answering("# Report"),
        );
        let crew = p.builder.build().unwrap();

        let out = crew.kickoff(inputs()).await.unwrap();

        assert!(matches!(&out.status, RunStatus::Failed(reason) if reason.contains("task 'price' failed")));
        assert!(out.final_output.is_none());

        let price = out.task("price").unwrap();
        assert_eq!(price.state, TaskState::Failed);
        assert!(price.error.is_some());

        let write = out.task("write").unwrap();
        assert_eq!(write.state, TaskState::Pending);
        assert!(write.blocked);
        assert_eq!(p.writer.call_count(), 0);
        assert_eq!(p.news.call_count(), 0);
    }

    #[tokio::test]
    async fn test_budget_truncates_with_partial_output() {
        let p = pipeline(
            answering("AAPL, price up"),
            answering("BTC greed"),
            answering("# Report"),
        );
        let crew = p.builder.max_iterations(2).build().unwrap();

        let out = crew.kickoff(inputs()).await.unwrap();

        assert_eq!(out.status, RunStatus::BudgetExceeded);
        assert_eq!(out.iterations_used, 2);
        assert_eq!(out.completed_outputs().count(), 2);
        let write = out.task("write").unwrap();
        assert_eq!(write.state, TaskState::Failed);
        assert!(write.error.as_deref().unwrap().contains("crew"));
        assert!(out.final_output.is_none());
        assert_eq!(p.writer.call_count(), 0);
    }

    #[tokio::test]
    async fn test_agent_ceiling_stops_run() {
        let looping = Arc::new(ScriptedProvider::from_fn(|_| {
            Ok(reply::tool_call("c", "missing_tool", json!({})))
        }));
        let p = pipeline(looping, answering("BTC greed"), answering("# Report"));
        let crew = p.builder.build().unwrap();

        let out = crew.kickoff(inputs()).await.unwrap();

        assert_eq!(out.status, RunStatus::BudgetExceeded);
        let price = out.task("price").unwrap();
        assert_eq!(price.iterations, 3);
        assert!(price.error.as_deref().unwrap().contains("agent 'Price Analyst'"));
        let expected = Error::BudgetExceeded {
            scope: BudgetScope::Agent("Price Analyst".to_string()),
            limit: 3,
        };
        assert_eq!(price.error.as_deref(), Some(expected.to_string().as_str()));
    }

    #[tokio::test]
    async fn test_hierarchical_manager_chooses_order() {
        let manager = Arc::new(ScriptedProvider::new(vec![reply::text("news")]));
        let p = pipeline(
            answering("AAPL, price up"),
            answering("BTC greed"),
            answering("# Report"),
        );
        let crew = p
            .builder
            .process(Process::Hierarchical)
            .manager_llm(manager.clone(), "gpt-4o")
            .build()
            .unwrap();

        let out = crew.kickoff(inputs()).await.unwrap();

        assert!(out.is_complete());
        assert_eq!(manager.call_count(), 1);
        assert_eq!(out.iterations_used, 4);
        assert_eq!(out.process, Process::Hierarchical);
    }

    struct Bogus;

    #[async_trait]
    impl ManagerPolicy for Bogus {
        fn name(&self) -> &str {
            "bogus"
        }

        async fn select(&self, _view: &ManagerView, _ctx: &Context) -> Result<String> {
            Ok("write".to_string())
        }
    }

    #[tokio::test]
    async fn test_selection_outside_ready_set_is_ignored() {
        let p = pipeline(
            answering("AAPL, price up"),
            answering("BTC greed"),
            answering("# Report"),
        );
        let crew = p.builder.manager_policy(Arc::new(Bogus)).build().unwrap();

        let out = crew.kickoff(inputs()).await.unwrap();

        assert!(out.is_complete());
        let write_prompt = p.writer.requests()[0].messages[0].text().unwrap();
        assert!(write_prompt.contains("AAPL, price up\n\nBTC greed"));
    }

    #[tokio::test]
    async fn test_delegating_agent_gets_coworker_tools() {
        let writer_provider = answering("# Report");
        let writer = Arc::new(
            CrewAgent::builder("Writer")
                .max_iter(3)
                .allow_delegation(true)
                .provider(writer_provider.clone())
                .build()
                .unwrap(),
        );
        let crew = Crew::builder()
            .task(task("price", agent("Price Analyst", answering("up")), &[]))
            .task(task("write", writer, &["price"]))
            .build()
            .unwrap();

        crew.kickoff(inputs()).await.unwrap();

        let tools = writer_provider.requests()[0].tools.clone().unwrap();
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["delegate_work", "ask_question"]);
        assert!(tools[0].description.contains("Price Analyst"));
    }

    struct NeedsKeyword;

    impl OutputGuard for NeedsKeyword {
        fn check(&self, output: &str, _calls: &[ToolInvocation]) -> GuardVerdict {
            if output.contains("up") {
                GuardVerdict::Accept(Some(json!({ "trend": "up" })))
            } else {
                GuardVerdict::retry("Say up, down or sideways.")
            }
        }
    }

    #[tokio::test]
    async fn test_guard_structured_output_recorded() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            reply::text("not sure"),
            reply::text("AAPL, price up"),
        ]));
        let guarded = Task::builder("price")
            .description("Analyse {{ ticker }}")
            .agent(agent("Price Analyst", provider))
            .guard(Arc::new(NeedsKeyword))
            .build()
            .unwrap();
        let crew = Crew::builder().task(guarded).build().unwrap();

        let out = crew.kickoff(inputs()).await.unwrap();

        let record = out.task("price").unwrap();
        assert_eq!(record.iterations, 2);
        assert_eq!(
            record.output.as_ref().unwrap().structured,
            Some(json!({ "trend": "up" }))
        );
        assert_eq!(out.final_text(), Some("AAPL, price up"));
    }

    #[tokio::test]
    async fn test_missing_inputs_fail_before_any_call() {
        let p = pipeline(answering("a"), answering("b"), answering("c"));
        let crew = p.builder.build().unwrap();

        let err = crew.kickoff(Context::new()).await.unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert_eq!(p.price.call_count() + p.news.call_count() + p.writer.call_count(), 0);
    }

    #[test]
    fn test_builder_validation() {
        let zero = Crew::builder()
            .task(task("price", agent("A", answering("x")), &[]))
            .max_iterations(0)
            .build();
        assert!(matches!(zero, Err(Error::Config(_))));

        let no_manager = Crew::builder()
            .task(task("price", agent("A", answering("x")), &[]))
            .process(Process::Hierarchical)
            .build();
        assert!(matches!(no_manager, Err(Error::Config(_))));

        let cyclic = Crew::builder()
            .task(task("a", agent("A", answering("x")), &["b"]))
            .task(task("b", agent("B", answering("x")), &["a"]))
            .build();
        assert!(matches!(cyclic, Err(Error::Config(_))));
    }
}
