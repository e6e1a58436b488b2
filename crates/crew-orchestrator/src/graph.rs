//! Task dependency graph
//!
//! Edges come from each task's context list. The graph is validated once at
//! construction; afterwards scheduling only asks which pending tasks have all
//! of their dependencies complete.

use crate::task::{Task, TaskState};
use crew_core::{Error, Result};
use std::collections::{BTreeSet, HashMap};

/// A validated DAG of tasks in declaration order
#[derive(Debug)]
pub struct TaskGraph {
    tasks: Vec<Task>,
    /// `deps[i]`: indices task `i` depends on
    deps: Vec<Vec<usize>>,
    /// Kahn order, ties broken by declaration order
    order: Vec<usize>,
}

impl TaskGraph {
    pub fn new(tasks: Vec<Task>) -> Result<Self> {
        if tasks.is_empty() {
            return Err(Error::Config("a crew needs at least one task".to_string()));
        }

        let mut index: HashMap<&str, usize> = HashMap::with_capacity(tasks.len());
        for (i, task) in tasks.iter().enumerate() {
            if index.insert(task.id(), i).is_some() {
                return Err(Error::Config(format!("duplicate task id '{}'", task.id())));
            }
        }

        let mut deps = Vec::with_capacity(tasks.len());
        for (i, task) in tasks.iter().enumerate() {
            let mut task_deps = Vec::new();
            for dep in task.context() {
                let &j = index.get(dep.as_str()).ok_or_else(|| {
                    Error::Config(format!(
                        "task '{}' depends on unknown task '{dep}'",
                        task.id()
                    ))
                })?;
                if j == i {
                    return Err(Error::Config(format!(
                        "task '{}' depends on itself",
                        task.id()
                    )));
                }
                if !task_deps.contains(&j) {
                    task_deps.push(j);
                }
            }
            deps.push(task_deps);
        }

        let order = topological_order(&deps).map_err(|stuck| {
            let names: Vec<&str> = stuck.iter().map(|&i| tasks[i].id()).collect();
            Error::Config(format!(
                "task dependencies form a cycle involving: {}",
                names.join(", ")
            ))
        })?;

        Ok(Self { tasks, deps, order })
    }

    /// Tasks in declaration order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id() == id)
    }

    pub fn dependencies(&self, index: usize) -> &[usize] {
        &self.deps[index]
    }

    /// Execution order a sequential run follows
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn topological_ids(&self) -> Vec<&str> {
        self.order.iter().map(|&i| self.tasks[i].id()).collect()
    }

    /// Pending tasks whose dependencies are all complete, in declaration order
    pub fn ready(&self, states: &[TaskState]) -> Vec<usize> {
        (0..self.tasks.len())
            .filter(|&i| states[i] == TaskState::Pending)
            .filter(|&i| {
                self.deps[i]
                    .iter()
                    .all(|&d| states[d] == TaskState::Complete)
            })
            .collect()
    }

    /// Every task that depends on `index`, directly or not
    pub fn dependents(&self, index: usize) -> Vec<usize> {
        let mut found = BTreeSet::new();
        let mut stack = vec![index];
        while let Some(current) = stack.pop() {
            for (i, task_deps) in self.deps.iter().enumerate() {
                if task_deps.contains(&current) && found.insert(i) {
                    stack.push(i);
                }
            }
        }
        found.into_iter().collect()
    }
}

/// Kahn's algorithm; on a cycle returns the indices that never became ready
fn topological_order(deps: &[Vec<usize>]) -> std::result::Result<Vec<usize>, Vec<usize>> {
    let n = deps.len();
    let mut in_degree: Vec<usize> = deps.iter().map(Vec::len).collect();
    let mut ready: BTreeSet<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);

    while let Some(next) = ready.pop_first() {
        order.push(next);
        for (i, task_deps) in deps.iter().enumerate() {
            if task_deps.contains(&next) {
                in_degree[i] -= 1;
                if in_degree[i] == 0 {
                    ready.insert(i);
                }
            }
        }
    }

    if order.len() == n {
        Ok(order)
    } else {
        Err((0..n).filter(|i| !order.contains(i)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crew_llm::testing::ScriptedProvider;
    use crew_runtime::CrewAgent;
    use std::sync::Arc;

    fn task(id: &str, context: &[&str]) -> Task {
        let agent = Arc::new(
            CrewAgent::builder("Analyst")
                .provider(Arc::new(ScriptedProvider::new(vec![])))
                .build()
                .unwrap(),
        );
        context
            .iter()
            .fold(Task::builder(id).description("do it").agent(agent), |b, dep| {
                b.context(*dep)
            })
            .build()
            .unwrap()
    }

    fn config_message(result: Result<TaskGraph>) -> String {
        match result {
            Err(Error::Config(message)) => message,
            other => panic!("expected a config error, got {other:?}"),
        }
    }

    #[test]
    fn test_order_follows_dependencies() {
        let graph = TaskGraph::new(vec![
            task("write", &["price", "news"]),
            task("price", &[]),
            task("news", &[]),
        ])
        .unwrap();

        assert_eq!(graph.topological_ids(), vec!["price", "news", "write"]);
        assert_eq!(graph.dependencies(0), &[1, 2]);
    }

    #[test]
    fn test_ties_keep_declaration_order() {
        let graph = TaskGraph::new(vec![task("b", &[]), task("a", &[]), task("c", &["a"])]).unwrap();
        assert_eq!(graph.topological_ids(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_ready_requires_complete_dependencies() {
        let graph = TaskGraph::new(vec![
            task("price", &[]),
            task("news", &[]),
            task("write", &["price", "news"]),
        ])
        .unwrap();

        let mut states = vec![TaskState::Pending; 3];
        assert_eq!(graph.ready(&states), vec![0, 1]);

        states[0] = TaskState::Complete;
        states[1] = TaskState::Running;
        assert!(graph.ready(&states).is_empty());

        states[1] = TaskState::Complete;
        assert_eq!(graph.ready(&states), vec![2]);

        states[1] = TaskState::Failed;
        assert!(graph.ready(&states).is_empty());
    }

    #[test]
    fn test_transitive_dependents() {
        let graph = TaskGraph::new(vec![
            task("a", &[]),
            task("b", &["a"]),
            task("c", &["b"]),
            task("d", &[]),
        ])
        .unwrap();

        assert_eq!(graph.dependents(0), vec![1, 2]);
        assert!(graph.dependents(3).is_empty());
    }

    #[test]
    fn test_rejects_invalid_graphs() {
        assert!(config_message(TaskGraph::new(vec![])).contains("at least one task"));

        let message = config_message(TaskGraph::new(vec![task("a", &[]), task("a", &[])]));
        assert!(message.contains("duplicate task id 'a'"));

        let message = config_message(TaskGraph::new(vec![task("a", &["ghost"])]));
        assert!(message.contains("unknown task 'ghost'"));

        let message = config_message(TaskGraph::new(vec![task("a", &["a"])]));
        assert!(message.contains("depends on itself"));

        let message = config_message(TaskGraph::new(vec![
            task("a", &["c"]),
            task("b", &["a"]),
            task("c", &["b"]),
            task("d", &[]),
        ]));
        assert!(message.contains("cycle involving: a, b, c"));
    }
}
