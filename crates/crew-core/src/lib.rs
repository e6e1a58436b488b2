//! Core abstractions for stock-crew
//!
//! This crate defines the fundamental traits and types shared by every other
//! crate in the workspace: the [`Agent`] trait, the run [`Context`], the
//! crew-wide [`IterationBudget`] and the [`Error`] taxonomy.

pub mod agent;
pub mod budget;
pub mod context;
pub mod error;

pub use agent::Agent;
pub use budget::IterationBudget;
pub use context::Context;
pub use error::{BudgetScope, Error, Result};
