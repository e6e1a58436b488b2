//! Crew orchestration for stock-crew
//!
//! A [`Crew`] owns a validated [`TaskGraph`], a [`ManagerPolicy`] that picks
//! the next ready task, and the run-wide iteration ceiling. [`Crew::kickoff`]
//! returns a [`CrewOutput`] that is partial when a task fails or the budget
//! runs out.

pub mod crew;
pub mod graph;
pub mod output;
pub mod policy;
pub mod task;

pub use crew::{Crew, CrewBuilder, CrewConfig, DEFAULT_MAX_ITERATIONS};
pub use graph::TaskGraph;
pub use output::{CrewOutput, RunStatus, TaskOutput, TaskRecord};
pub use policy::{
    LlmManagerPolicy, ManagerPolicy, ManagerView, Process, ReadyTask, SequentialPolicy,
};
pub use task::{Task, TaskBuilder, TaskState};
