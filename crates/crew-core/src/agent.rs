//! Core Agent trait definition

use crate::{Context, Result};
use async_trait::async_trait;

/// Core trait that all agents must implement
///
/// Input and output are plain text. Concrete agents (see `crew-runtime`)
/// wrap an LLM loop; the run budget travels in the [`Context`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Agent: Send + Sync {
    /// Process input and return output
    async fn process(&self, input: String, context: &mut Context) -> Result<String>;

    /// Get the agent's name
    ///
    /// For crew agents this is the role, which coworkers use to address it.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_agent_sees_context() {
        let mut agent = MockAgent::new();
        agent.expect_name().return_const("Analyst".to_string());
        agent
            .expect_process()
            .withf(|input, ctx| input == "hi" && ctx.ticker() == Some("AAPL"))
            .returning(|_, _| Ok("hello".to_string()));

        let mut ctx = Context::new().with_ticker("AAPL");
        let out = agent.process("hi".to_string(), &mut ctx).await.unwrap();

        assert_eq!(out, "hello");
        assert_eq!(agent.name(), "Analyst");
    }
}
