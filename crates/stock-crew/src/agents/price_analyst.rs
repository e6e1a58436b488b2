//! Senior Stock Price Analyst

use super::AgentLlm;
use crate::prompts::{self, PRICE_ANALYST_BACKSTORY, PRICE_ANALYST_GOAL, PRICE_ANALYST_ROLE};
use crew_core::Result;
use crew_prompt::PromptRegistry;
use crew_runtime::CrewAgent;
use crew_tools::Tool;
use std::sync::Arc;

pub const MAX_ITER: usize = 5;

/// Reads a year of prices and classifies the trend; never delegates
pub fn price_analyst(
    prompts: &PromptRegistry,
    llm: &AgentLlm,
    market_data: Arc<dyn Tool>,
) -> Result<CrewAgent> {
    let builder = CrewAgent::builder(PRICE_ANALYST_ROLE)
        .goal(prompts::source(prompts, PRICE_ANALYST_GOAL)?)
        .backstory(prompts::source(prompts, PRICE_ANALYST_BACKSTORY)?)
        .max_iter(MAX_ITER)
        .allow_delegation(false)
        .tool(market_data);
    llm.apply(builder).build()
}
