//! Error types for prompt operations

use thiserror::Error;

/// Result type for prompt operations
pub type Result<T> = std::result::Result<T, PromptError>;

#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Failed to parse template '{name}': {detail}")]
    TemplateParseFailed { name: String, detail: String },

    #[error("Failed to render template '{name}': {detail}")]
    RenderError { name: String, detail: String },

    #[error("Template '{0}' not registered")]
    TemplateNotRegistered(String),
}

impl From<PromptError> for crew_core::Error {
    fn from(err: PromptError) -> Self {
        match err {
            PromptError::TemplateParseFailed { .. } | PromptError::TemplateNotRegistered(_) => {
                crew_core::Error::Config(err.to_string())
            }
            PromptError::RenderError { .. } => crew_core::Error::ProcessingFailed(err.to_string()),
        }
    }
}
