//! Stock News Analyst

use super::AgentLlm;
use crate::prompts::{self, NEWS_ANALYST_BACKSTORY, NEWS_ANALYST_GOAL, NEWS_ANALYST_ROLE};
use crew_core::Result;
use crew_prompt::PromptRegistry;
use crew_runtime::CrewAgent;
use crew_tools::Tool;
use std::sync::Arc;

pub const MAX_ITER: usize = 10;

/// Searches news per asset and scores fear/greed; never delegates
pub fn news_analyst(
    prompts: &PromptRegistry,
    llm: &AgentLlm,
    news_search: Arc<dyn Tool>,
) -> Result<CrewAgent> {
    let builder = CrewAgent::builder(NEWS_ANALYST_ROLE)
        .goal(prompts::source(prompts, NEWS_ANALYST_GOAL)?)
        .backstory(prompts::source(prompts, NEWS_ANALYST_BACKSTORY)?)
        .max_iter(MAX_ITER)
        .allow_delegation(false)
        .tool(news_search);
    llm.apply(builder).build()
}
