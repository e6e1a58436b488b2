//! Error types for crew-core

use std::fmt;
use thiserror::Error;

/// Result type alias for crew-core
pub type Result<T> = std::result::Result<T, Error>;

/// Which iteration ceiling was hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BudgetScope {
    /// The crew-wide ceiling shared by every agent and the manager
    Crew,
    /// A single agent's own `max_iter`, keyed by role
    Agent(String),
}

impl fmt::Display for BudgetScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Crew => write!(f, "crew"),
            Self::Agent(role) => write!(f, "agent '{role}'"),
        }
    }
}

/// Error type for crew operations
#[derive(Error, Debug)]
pub enum Error {
    /// A tool failed: provider/network failure or an empty result
    #[error("Tool '{tool}' failed: {message}")]
    Tool {
        /// Name of the failing tool
        tool: String,
        /// Human readable failure description
        message: String,
    },

    /// An iteration ceiling was reached before output was produced
    #[error("Iteration budget exceeded for {scope} (limit {limit})")]
    BudgetExceeded {
        /// Which ceiling was reached
        scope: BudgetScope,
        /// The configured ceiling
        limit: usize,
    },

    /// Invalid or missing configuration, fatal before any task runs
    #[error("Configuration error: {0}")]
    Config(String),

    /// Language model call failed
    #[error("LLM error: {0}")]
    Llm(String),

    /// Agent initialization failed
    #[error("Agent initialization failed: {0}")]
    InitializationFailed(String),

    /// Agent processing failed
    #[error("Agent processing failed: {0}")]
    ProcessingFailed(String),

    /// Generic error message
    #[error("{0}")]
    Generic(String),
}

impl Error {
    /// Shorthand for a [`Error::Tool`]
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Whether this error ends the whole run rather than a single step
    pub fn is_crew_budget(&self) -> bool {
        matches!(
            self,
            Self::BudgetExceeded {
                scope: BudgetScope::Crew,
                ..
            }
        )
    }

    /// Whether this is any kind of budget exhaustion
    pub fn is_budget_exceeded(&self) -> bool {
        matches!(self, Self::BudgetExceeded { .. })
    }
}
