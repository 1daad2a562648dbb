//! Reply-language detection

use advisor_core::{Language, Message};
use advisor_llm::{ChatBackend, ToolBuilder};

use crate::prompts;

/// Detects the user's language with a single structured-extraction call.
/// Any failure falls back to English. The result steers only the final
/// generation instruction, never filtering.
pub struct LanguageDetector {
    tool: advisor_core::ToolDefinition,
}

impl Default for LanguageDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageDetector {
    pub fn new() -> Self {
        let tool = ToolBuilder::new("detect_language", "Identify the language of the message")
            .param("language", "string", "Language of the user's message", true)
            .string_enum("language", &["english", "russian"])
            .build();
        Self { tool }
    }

    pub async fn detect(&self, backend: &dyn ChatBackend, text: &str) -> Language {
        let messages = [
            Message::system(prompts::DETECTOR_SYSTEM_PROMPT),
            Message::user(text),
        ];

        match backend.extract_structured(&messages, &self.tool).await {
            Ok(call) => match call.get_str("language").and_then(Language::from_str_loose) {
                Some(language) => language,
                None => {
                    tracing::warn!("Language payload unusable, defaulting to English");
                    Language::default()
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Language detection failed, defaulting to English");
                Language::default()
            }
        }
    }
}
