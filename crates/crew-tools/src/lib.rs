//! Tool management and execution framework for stock-crew
//!
//! This crate provides the [`Tool`] trait agents call, the per-agent
//! [`ToolRegistry`], and the [`RetryPolicy`] tools use around provider calls.

pub mod registry;
pub mod retry;
pub mod tool;

pub use registry::ToolRegistry;
pub use retry::{RetryPolicy, Transient};
pub use tool::{Tool, parse_params};
