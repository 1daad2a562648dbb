//! Conversation orchestration
//!
//! Ties the pieces together, one turn at a time: extract and merge durable
//! preferences, detect the reply language, classify intent, then run the
//! two-phase tool-call protocol against the catalog. Every failure path
//! degrades to a defined fallback; a failed turn never corrupts the
//! preference set or the history.

pub mod advisor;
pub mod brands;
pub mod bridge;
pub mod intent;
pub mod language;
pub mod preferences;
pub mod prompts;

#[cfg(test)]
pub(crate) mod testing;

pub use advisor::{Advisor, HISTORY_WINDOW};
pub use brands::BrandResolver;
pub use bridge::ToolCallBridge;
pub use intent::IntentClassifier;
pub use language::LanguageDetector;
pub use preferences::{PreferenceDelta, PreferenceExtractor, PreferenceSet};

use thiserror::Error;

/// Turn-level failures. Mapped to a fixed apology by the orchestrator,
/// never surfaced to the end user as a raw error.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Reasoning service failure: {0}")]
    Service(#[from] advisor_llm::LlmError),
}

impl From<AgentError> for advisor_core::Error {
    fn from(err: AgentError) -> Self {
        advisor_core::Error::Agent(err.to_string())
    }
}
