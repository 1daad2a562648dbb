//! Reasoning-service boundary
//!
//! The conversation layer consumes the generative reasoning service purely
//! at this interface: open-ended generation (optionally with tools the
//! model may call) and forced structured extraction (the model must call
//! the given tool). `OpenAiBackend` implements the interface over any
//! OpenAI-compatible chat-completions endpoint.

pub mod backend;
pub mod prompt;

pub use backend::{ChatBackend, LlmConfig, OpenAiBackend};
pub use prompt::ToolBuilder;

use thiserror::Error;

/// Reasoning-service errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Generation error: {0}")]
    Generation(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Model did not call required tool: {0}")]
    MissingToolCall(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for advisor_core::Error {
    fn from(err: LlmError) -> Self {
        advisor_core::Error::Llm(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_failure_maps_into_shared_error() {
        let shared: advisor_core::Error = LlmError::Timeout.into();
        assert!(matches!(shared, advisor_core::Error::Llm(_)));
    }
}
