//! Run context shared by the agents of one crew run
//!
//! The `Context` carries the run inputs (ticker, current date, anything the
//! caller adds) as JSON values, plus the run's [`IterationBudget`].

use crate::budget::IterationBudget;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Well-known context keys
pub mod keys {
    /// Ticker symbol the run is about
    pub const TICKER: &str = "ticker";
    /// Run date as `YYYY-MM-DD`
    pub const CURRENT_DATE: &str = "current_date";
}

/// Context passed to agents during a run
///
/// Inputs are stored in a sorted map so rendering them is deterministic.
/// Cloning a context shares its budget.
///
/// # Example
///
/// ```
/// use crew_core::{Context, IterationBudget};
///
/// let ctx = Context::new()
///     .with_ticker("AAPL")
///     .with_current_date("2025-06-02")
///     .with_budget(IterationBudget::new(15));
///
/// assert_eq!(ctx.ticker(), Some("AAPL"));
/// assert_eq!(ctx.budget().limit(), 15);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    data: BTreeMap<String, Value>,
    budget: IterationBudget,
}

impl Context {
    /// Create a new empty context with an unlimited budget
    pub fn new() -> Self {
        Self::default()
    }

    // =========== Builder Methods ===========

    /// Set the ticker input
    pub fn with_ticker(mut self, ticker: impl Into<String>) -> Self {
        self.insert(keys::TICKER, Value::String(ticker.into()));
        self
    }

    /// Set the current date input
    pub fn with_current_date(mut self, date: impl Into<String>) -> Self {
        self.insert(keys::CURRENT_DATE, Value::String(date.into()));
        self
    }

    /// Add an arbitrary input
    pub fn with_input(mut self, key: impl Into<String>, value: Value) -> Self {
        self.insert(key, value);
        self
    }

    /// Attach the run budget
    pub fn with_budget(mut self, budget: IterationBudget) -> Self {
        self.budget = budget;
        self
    }

    // =========== Common Accessors ===========

    pub fn ticker(&self) -> Option<&str> {
        self.get(keys::TICKER).and_then(Value::as_str)
    }

    pub fn current_date(&self) -> Option<&str> {
        self.get(keys::CURRENT_DATE).and_then(Value::as_str)
    }

    /// The run's iteration budget
    pub fn budget(&self) -> &IterationBudget {
        &self.budget
    }

    /// All inputs as a JSON object, for template rendering
    pub fn template_vars(&self) -> Value {
        let map: Map<String, Value> = self
            .data
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Value::Object(map)
    }

    // =========== Generic Key-Value Operations ===========

    /// Insert a value into the context
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    /// Get a value from the context
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_run_inputs() {
        let ctx = Context::new()
            .with_ticker("AAPL")
            .with_current_date("2025-06-02");

        assert_eq!(ctx.ticker(), Some("AAPL"));
        assert_eq!(ctx.current_date(), Some("2025-06-02"));
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn test_template_vars_is_object() {
        let ctx = Context::new()
            .with_ticker("MSFT")
            .with_input("reference_asset", json!("BTC"));

        let vars = ctx.template_vars();
        assert_eq!(vars["ticker"], "MSFT");
        assert_eq!(vars["reference_asset"], "BTC");
    }

    #[test]
    fn test_clone_shares_budget() {
        let ctx = Context::new().with_budget(IterationBudget::new(4));
        let clone = ctx.clone();

        clone.budget().try_consume().unwrap();
        assert_eq!(ctx.budget().used(), 1);
    }
}
