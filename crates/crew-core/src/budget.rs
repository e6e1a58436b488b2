//! Shared iteration budget
//!
//! One [`IterationBudget`] is created per run and cloned into every agent
//! executor and the manager policy. Clones share the same counter, so the
//! ceiling applies to the run as a whole.

use crate::error::{BudgetScope, Error, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug)]
struct Counter {
    limit: usize,
    used: AtomicUsize,
}

/// Crew-wide ceiling on reasoning steps
#[derive(Debug, Clone)]
pub struct IterationBudget {
    counter: Arc<Counter>,
}

impl IterationBudget {
    /// Create a budget allowing `limit` steps
    pub fn new(limit: usize) -> Self {
        Self {
            counter: Arc::new(Counter {
                limit,
                used: AtomicUsize::new(0),
            }),
        }
    }

    /// A budget that never runs out
    pub fn unlimited() -> Self {
        Self::new(usize::MAX)
    }

    /// Take one step from the budget
    ///
    /// Returns the number of steps used so far including this one, or
    /// [`Error::BudgetExceeded`] when the ceiling was already reached.
    pub fn try_consume(&self) -> Result<usize> {
        let limit = self.counter.limit;
        self.counter
            .used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                (used < limit).then_some(used + 1)
            })
            .map(|previous| previous + 1)
            .map_err(|_| Error::BudgetExceeded {
                scope: BudgetScope::Crew,
                limit,
            })
    }

    /// Configured ceiling
    pub fn limit(&self) -> usize {
        self.counter.limit
    }

    /// Steps consumed so far
    pub fn used(&self) -> usize {
        self.counter.used.load(Ordering::SeqCst)
    }

    /// Steps left before the ceiling
    pub fn remaining(&self) -> usize {
        self.limit().saturating_sub(self.used())
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }
}

impl Default for IterationBudget {
    fn default() -> Self {
        Self::unlimited()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consume_until_exhausted() {
        let budget = IterationBudget::new(2);
        assert_eq!(tokio_test::assert_ok!(budget.try_consume()), 1);
        assert_eq!(tokio_test::assert_ok!(budget.try_consume()), 2);
        assert!(budget.is_exhausted());

        let err = budget.try_consume().unwrap_err();
        assert!(err.is_crew_budget());
        assert_eq!(budget.used(), 2);
    }

    #[test]
    fn test_clones_share_counter() {
        let budget = IterationBudget::new(3);
        let clone = budget.clone();

        budget.try_consume().unwrap();
        clone.try_consume().unwrap();

        assert_eq!(budget.used(), 2);
        assert_eq!(clone.remaining(), 1);
    }

    #[test]
    fn test_zero_budget() {
        let budget = IterationBudget::new(0);
        assert!(budget.is_exhausted());
        tokio_test::assert_err!(budget.try_consume());
    }

    #[test]
    fn test_unlimited() {
        let budget = IterationBudget::unlimited();
        for _ in 0..100 {
            budget.try_consume().unwrap();
        }
        assert!(!budget.is_exhausted());
    }
}
