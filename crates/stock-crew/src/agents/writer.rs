//! Senior Stock Analyst Writer

use super::AgentLlm;
use crate::prompts::{self, WRITER_BACKSTORY, WRITER_GOAL, WRITER_ROLE};
use crew_core::Result;
use crew_prompt::PromptRegistry;
use crew_runtime::CrewAgent;

pub const MAX_ITER: usize = 5;

/// Turns the price trend and news report into a newsletter
///
/// Has no tools of its own. It may delegate work or questions to the other
/// analysts of the crew.
pub fn writer(prompts: &PromptRegistry, llm: &AgentLlm) -> Result<CrewAgent> {
    let builder = CrewAgent::builder(WRITER_ROLE)
        .goal(prompts::source(prompts, WRITER_GOAL)?)
        .backstory(prompts::source(prompts, WRITER_BACKSTORY)?)
        .max_iter(MAX_ITER)
        .allow_delegation(true);
    llm.apply(builder).build()
}
