//! Agent runtime for stock-crew
//!
//! - [`AgentExecutor`]: the LLM → tool → loop cycle, bounded by the agent's
//!   own ceiling and the shared run budget
//! - [`CrewAgent`]: a persona (role, goal, backstory) bound to tools and a model
//! - [`OutputGuard`]: validation of a final answer before it is accepted
//! - delegation tools that let one agent hand work to a coworker

pub mod agent;
pub mod delegation;
pub mod executor;
pub mod guard;

pub use agent::{CrewAgent, CrewAgentBuilder};
pub use delegation::{ASK_QUESTION, AskQuestionTool, DELEGATE_WORK, DelegateWorkTool, delegation_tools};
pub use executor::{
    AgentExecutor, AgentExecutorBuilder, ExecutionOutcome, ExecutorConfig, RunOptions,
    ToolInvocation,
};
pub use guard::{AcceptAll, GuardVerdict, OutputGuard, last_failure, successful_calls};
