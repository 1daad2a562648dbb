//! Dialog orchestrator

use std::sync::Arc;

use uuid::Uuid;

use advisor_catalog::CatalogIndex;
use advisor_core::{History, Turn};
use advisor_llm::ChatBackend;

use crate::bridge::ToolCallBridge;
use crate::intent::IntentClassifier;
use crate::language::LanguageDetector;
use crate::preferences::{PreferenceExtractor, PreferenceSet};
use crate::prompts;

/// Reasoning steps see only this many most-recent turns
pub const HISTORY_WINDOW: usize = 10;

/// One shopper's conversation. Turns are processed strictly sequentially;
/// the only state carried between turns is the append-only history and the
/// merge-only preference set. Dependencies are injected so multiple
/// independent conversations can share a backend and a catalog.
pub struct Advisor {
    backend: Arc<dyn ChatBackend>,
    catalog: Arc<CatalogIndex>,
    classifier: IntentClassifier,
    detector: LanguageDetector,
    extractor: PreferenceExtractor,
    history: History,
    preferences: PreferenceSet,
}

impl Advisor {
    pub fn new(backend: Arc<dyn ChatBackend>, catalog: Arc<CatalogIndex>) -> Self {
        let extractor = PreferenceExtractor::new(catalog.all_brands());
        Self {
            backend,
            catalog,
            classifier: IntentClassifier::new(),
            detector: LanguageDetector::new(),
            extractor,
            history: History::new(),
            preferences: PreferenceSet::default(),
        }
    }

    /// Process one user turn and return the assistant's answer.
    ///
    /// Never fails outward: a failed turn yields the fixed apology and
    /// leaves history and preferences intact for the next turn.
    pub async fn respond(&mut self, user_input: &str) -> String {
        let turn_id = Uuid::new_v4();
        tracing::info!(%turn_id, input = user_input, "Turn started");

        let delta = self.extractor.extract(self.backend.as_ref(), user_input).await;
        self.preferences.merge(&delta);

        let language = self.detector.detect(self.backend.as_ref(), user_input).await;
        let intent = self.classifier.classify(self.backend.as_ref(), user_input).await;
        tracing::info!(%turn_id, %intent, %language, "Turn routed");

        self.history.push(Turn::user(user_input));

        let bridge = ToolCallBridge::new(self.backend.as_ref(), &self.catalog);
        let answer = match bridge
            .run(
                prompts::profile(intent),
                self.history.recent(HISTORY_WINDOW),
                &self.preferences,
                language,
            )
            .await
        {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(%turn_id, error = %e, "Turn failed");
                prompts::APOLOGY.to_string()
            }
        };

        self.history.push(Turn::assistant(&answer));
        tracing::info!(%turn_id, "Turn finished");
        answer
    }

    /// Full transcript, oldest first
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Preferences accumulated so far
    pub fn preferences(&self) -> &PreferenceSet {
        &self.preferences
    }
}
