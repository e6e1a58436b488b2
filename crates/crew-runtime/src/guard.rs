//! Output guards
//!
//! A guard inspects an agent's final answer before the executor accepts it.
//! It can accept the answer (optionally with a structured form), ask the
//! agent to try again with feedback, or fail the run of that task.

use crate::executor::ToolInvocation;
use crew_core::Error;
use serde_json::Value;

/// Decision taken by an [`OutputGuard`]
#[derive(Debug)]
pub enum GuardVerdict {
    /// Output is acceptable; carries the parsed structure if there is one
    Accept(Option<Value>),
    /// Send this feedback to the agent and keep looping
    Retry(String),
    /// Stop; the task fails with this error
    Reject(Error),
}

impl GuardVerdict {
    pub fn accept() -> Self {
        Self::Accept(None)
    }

    pub fn retry(feedback: impl Into<String>) -> Self {
        Self::Retry(feedback.into())
    }
}

/// Validates a final answer against the tool calls made to produce it
pub trait OutputGuard: Send + Sync {
    fn check(&self, output: &str, calls: &[ToolInvocation]) -> GuardVerdict;
}

/// Accepts anything
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl OutputGuard for AcceptAll {
    fn check(&self, _output: &str, _calls: &[ToolInvocation]) -> GuardVerdict {
        GuardVerdict::accept()
    }
}

/// Successful invocations of `tool`
pub fn successful_calls<'a>(
    calls: &'a [ToolInvocation],
    tool: &'a str,
) -> impl Iterator<Item = &'a ToolInvocation> + 'a {
    calls
        .iter()
        .filter(move |c| c.name == tool && c.succeeded())
}

/// The most recent error returned by `tool`, if every call to it failed
pub fn last_failure<'a>(calls: &'a [ToolInvocation], tool: &str) -> Option<&'a str> {
    let mut attempts = calls.iter().filter(|c| c.name == tool).peekable();
    attempts.peek()?;
    let mut last = None;
    for call in attempts {
        match &call.error {
            Some(error) => last = Some(error.as_str()),
            None => return None,
        }
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(name: &str, error: Option<&str>) -> ToolInvocation {
        ToolInvocation {
            name: name.to_string(),
            input: json!({}),
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn test_successful_calls() {
        let calls = vec![
            call("market_data", Some("no data")),
            call("market_data", None),
            call("news_search", None),
        ];
        assert_eq!(successful_calls(&calls, "market_data").count(), 1);
        assert_eq!(successful_calls(&calls, "delegate_work").count(), 0);
    }

    #[test]
    fn test_last_failure() {
        let failed = vec![call("market_data", Some("first")), call("market_data", Some("second"))];
        assert_eq!(last_failure(&failed, "market_data"), Some("second"));

        let recovered = vec![call("market_data", Some("first")), call("market_data", None)];
        assert_eq!(last_failure(&recovered, "market_data"), None);

        assert_eq!(last_failure(&[], "market_data"), None);
    }

    #[test]
    fn test_accept_all() {
        assert!(matches!(
            AcceptAll.check("anything", &[]),
            GuardVerdict::Accept(None)
        ));
    }
}
