//! The three analysts of the stock crew
//!
//! Each constructor binds a persona from [`crate::prompts`] to the shared
//! LLM, its tools and its own iteration ceiling.

pub mod news_analyst;
pub mod price_analyst;
pub mod writer;

pub use news_analyst::news_analyst;
pub use price_analyst::price_analyst;
pub use writer::writer;

use crew_llm::LLMProvider;
use std::sync::Arc;

/// Model settings shared by every analyst
#[derive(Clone)]
pub struct AgentLlm {
    pub provider: Arc<dyn LLMProvider>,
    pub model: String,
    pub temperature: Option<f32>,
}

impl AgentLlm {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub(crate) fn apply(&self, builder: crew_runtime::CrewAgentBuilder) -> crew_runtime::CrewAgentBuilder {
        let builder = builder
            .provider(Arc::clone(&self.provider))
            .model(&self.model);
        match self.temperature {
            Some(t) => builder.temperature(t),
            None => builder,
        }
    }
}

impl std::fmt::Debug for AgentLlm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentLlm")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}
