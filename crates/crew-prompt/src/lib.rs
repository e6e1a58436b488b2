//! Prompt template management for stock-crew
//!
//! Task descriptions, expected outputs and agent personas are Jinja2
//! templates rendered against the crew inputs (`ticker`, `current_date`).
//! [`PromptBuilder`] assembles the final task message around them.
//!
//! ```
//! use crew_prompt::{JinjaTemplate, PromptRegistry};
//! use serde_json::json;
//!
//! let registry = PromptRegistry::new();
//! registry.register(JinjaTemplate::new(
//!     "news_task",
//!     "Take the stock and always include BTC to it. The current date is {{ current_date }}.",
//! )?);
//!
//! let prompt = registry.render("news_task", &json!({ "current_date": "2024-05-01" }))?;
//! assert!(prompt.ends_with("2024-05-01."));
//! # Ok::<(), crew_prompt::PromptError>(())
//! ```

mod builder;
mod error;
mod jinja;
mod registry;
mod template;

pub use builder::PromptBuilder;
pub use error::{PromptError, Result};
pub use jinja::JinjaTemplate;
pub use registry::PromptRegistry;
pub use template::PromptTemplate;
