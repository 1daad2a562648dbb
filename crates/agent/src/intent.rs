//! Intent classification with bounded retry

use advisor_core::{Intent, Message};
use advisor_llm::{ChatBackend, ToolBuilder};

use crate::prompts;

/// Attempts before falling back to the default intent
const MAX_ATTEMPTS: u32 = 5;

/// Classifies one user message into a closed intent set via forced
/// structured extraction. Up to five independent attempts; after that the
/// turn routes to `general_inquiry`, the most permissive handling path.
pub struct IntentClassifier {
    tool: advisor_core::ToolDefinition,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier {
    pub fn new() -> Self {
        let labels: Vec<&str> = Intent::ALL.iter().map(|i| i.as_str()).collect();
        let tool = ToolBuilder::new("classify_intent", "Classify the user's primary intent")
            .param("intent", "string", "The user's primary intent", true)
            .string_enum("intent", &labels)
            .build();
        Self { tool }
    }

    pub async fn classify(&self, backend: &dyn ChatBackend, text: &str) -> Intent {
        let messages = [
            Message::system(prompts::CLASSIFIER_SYSTEM_PROMPT),
            Message::user(text),
        ];

        for attempt in 1..=MAX_ATTEMPTS {
            match backend.extract_structured(&messages, &self.tool).await {
                Ok(call) => match call.get_str("intent").and_then(Intent::from_str_strict) {
                    Some(intent) => {
                        tracing::debug!(%intent, attempt, "Intent classified");
                        return intent;
                    }
                    None => {
                        tracing::warn!(attempt, "Intent payload unusable");
                    }
                },
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Intent classification failed");
                }
            }
        }

        tracing::warn!(
            attempts = MAX_ATTEMPTS,
            "Intent classification exhausted retries, defaulting to general_inquiry"
        );
        Intent::default()
    }
}
