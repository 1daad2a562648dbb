//! Durable preference tracking
//!
//! Preferences accumulate across the conversation and are never pruned;
//! each turn extracts a delta of explicitly asserted facts and merges it
//! in, last write winning per key. Extraction failures yield an empty
//! delta and are logged, never raised.

use serde::{Deserialize, Serialize};

use advisor_catalog::CpuBrand;
use advisor_core::Message;
use advisor_llm::{ChatBackend, ToolBuilder};

use crate::prompts;

/// Accumulated shopper preferences. All fields optional; only explicitly
/// asserted values are ever set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferenceSet {
    pub brand: Option<String>,
    pub min_ram_gb: Option<i64>,
    pub min_storage_gb: Option<i64>,
    pub screen_inch: Option<f64>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub cpu_brand: Option<CpuBrand>,
    pub needs_dedicated_gpu: Option<bool>,
    pub color: Option<String>,
}

/// One turn's worth of newly asserted preferences
pub type PreferenceDelta = PreferenceSet;

impl PreferenceSet {
    /// Merge a delta in: the delta wins per key, absent keys leave the
    /// existing value untouched.
    pub fn merge(&mut self, delta: &PreferenceDelta) {
        macro_rules! take {
            ($field:ident) => {
                if let Some(value) = &delta.$field {
                    self.$field = Some(value.clone());
                }
            };
        }
        take!(brand);
        take!(min_ram_gb);
        take!(min_storage_gb);
        take!(screen_inch);
        take!(min_price);
        take!(max_price);
        take!(cpu_brand);
        take!(needs_dedicated_gpu);
        take!(color);
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Extracts a preference delta from the user's message via forced
/// structured extraction.
pub struct PreferenceExtractor {
    tool: advisor_core::ToolDefinition,
}

impl PreferenceExtractor {
    /// The brand field is constrained to the catalog's known brands so the
    /// model cannot assert a brand the store does not carry.
    pub fn new(known_brands: &[String]) -> Self {
        let tool = ToolBuilder::new(
            "record_preferences",
            "Record shopping preferences the user explicitly stated in this message",
        )
        .param("brand", "string", "Preferred brand", false)
        .string_enum("brand", known_brands)
        .param("min_ram_gb", "integer", "Minimum RAM in GB", false)
        .param("min_storage_gb", "integer", "Minimum storage in GB", false)
        .param("screen_inch", "number", "Preferred screen size in inches", false)
        .param("min_price", "integer", "Minimum price", false)
        .param("max_price", "integer", "Maximum price", false)
        .param("cpu_brand", "string", "Preferred CPU maker", false)
        .string_enum("cpu_brand", &["intel", "amd", "apple"])
        .param(
            "needs_dedicated_gpu",
            "boolean",
            "Whether the user requires a dedicated graphics card",
            false,
        )
        .param("color", "string", "Preferred color", false)
        .build();
        Self { tool }
    }

    /// Extract a delta from one message. Any failure yields an empty
    /// delta; the turn continues with the preferences it already has.
    pub async fn extract(&self, backend: &dyn ChatBackend, text: &str) -> PreferenceDelta {
        let messages = [
            Message::system(prompts::EXTRACTOR_SYSTEM_PROMPT),
            Message::user(text),
        ];

        match backend.extract_structured(&messages, &self.tool).await {
            Ok(call) => {
                let delta = PreferenceDelta {
                    brand: non_empty(call.get_str("brand")),
                    min_ram_gb: call.get_i64("min_ram_gb"),
                    min_storage_gb: call.get_i64("min_storage_gb"),
                    screen_inch: call.arguments.get("screen_inch").and_then(|v| v.as_f64()),
                    min_price: call.get_i64("min_price"),
                    max_price: call.get_i64("max_price"),
                    cpu_brand: call.get_str("cpu_brand").and_then(CpuBrand::parse),
                    needs_dedicated_gpu: call.get_bool("needs_dedicated_gpu"),
                    color: non_empty(call.get_str("color")),
                };
                if !delta.is_empty() {
                    tracing::debug!(?delta, "Extracted preference delta");
                }
                delta
            }
            Err(e) => {
                tracing::warn!(error = %e, "Preference extraction failed, continuing with empty delta");
                PreferenceDelta::default()
            }
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
