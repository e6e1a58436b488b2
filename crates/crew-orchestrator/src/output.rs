//! Run output bundle

use crate::policy::Process;
use crate::task::TaskState;
use crew_runtime::ToolInvocation;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What one task produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutput {
    pub task: String,
    /// Role of the agent that produced it
    pub agent: String,
    pub raw: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured: Option<Value>,
}

/// Per-task summary of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub agent_role: String,
    pub state: TaskState,
    /// Left pending because an upstream task failed
    pub blocked: bool,
    pub output: Option<TaskOutput>,
    pub error: Option<String>,
    /// Budget units spent while the task was running
    pub iterations: usize,
    pub tool_calls: Vec<ToolInvocation>,
}

impl TaskRecord {
    pub(crate) fn pending(id: &str, agent_role: &str) -> Self {
        Self {
            id: id.to_string(),
            agent_role: agent_role.to_string(),
            state: TaskState::Pending,
            blocked: false,
            output: None,
            error: None,
            iterations: 0,
            tool_calls: Vec::new(),
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    BudgetExceeded,
    Failed(String),
}

/// Everything a run produced, complete or partial
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewOutput {
    pub ticker: Option<String>,
    pub run_date: Option<String>,
    pub process: Process,
    pub status: RunStatus,
    /// In declaration order
    pub tasks: Vec<TaskRecord>,
    /// Output of the last task in dependency order, only for completed runs
    pub final_output: Option<TaskOutput>,
    pub iterations_used: usize,
}

impl CrewOutput {
    pub fn is_complete(&self) -> bool {
        self.status == RunStatus::Completed
    }

    pub fn task(&self, id: &str) -> Option<&TaskRecord> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Final text, if the run completed
    pub fn final_text(&self) -> Option<&str> {
        self.final_output.as_ref().map(|o| o.raw.as_str())
    }

    /// Outputs of the tasks that completed
    pub fn completed_outputs(&self) -> impl Iterator<Item = &TaskOutput> {
        self.tasks.iter().filter_map(|t| t.output.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn output(status: RunStatus) -> CrewOutput {
        let mut done = TaskRecord::pending("price", "Senior Stock Price Analyst");
        done.state = TaskState::Complete;
        done.output = Some(TaskOutput {
            task: "price".to_string(),
            agent: "Senior Stock Price Analyst".to_string(),
            raw: "AAPL, price up".to_string(),
            structured: None,
        });
        let mut blocked = TaskRecord::pending("write", "Senior Stock Analyst Writer");
        blocked.blocked = true;

        CrewOutput {
            ticker: Some("AAPL".to_string()),
            run_date: Some("2025-06-02".to_string()),
            process: Process::Sequential,
            status,
            tasks: vec![done, blocked],
            final_output: None,
            iterations_used: 3,
        }
    }

    #[test]
    fn test_partial_output_accessors() {
        let out = output(RunStatus::BudgetExceeded);
        assert!(!out.is_complete());
        assert!(out.final_text().is_none());
        assert_eq!(out.completed_outputs().count(), 1);
        assert!(out.task("write").unwrap().blocked);
        assert!(out.task("missing").is_none());
    }

    #[test]
    fn test_status_serialization() {
        let value = serde_json::to_value(output(RunStatus::Failed("boom".to_string()))).unwrap();
        assert_eq!(value["status"], json!({ "kind": "failed", "reason": "boom" }));
        assert_eq!(value["process"], json!("sequential"));
        assert_eq!(value["tasks"][0]["state"], json!("complete"));

        let value = serde_json::to_value(RunStatus::Completed).unwrap();
        assert_eq!(value, json!({ "kind": "completed" }));
    }
}
