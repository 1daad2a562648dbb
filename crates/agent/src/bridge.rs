//! Two-phase tool-call protocol
//!
//! Phase one exposes the catalog search as a tool and lets the model
//! decide whether to invoke it; turns answerable from history alone come
//! back as direct text. Phase two executes each invocation against the
//! retrieval engine, appends the raw results keyed by invocation id, and
//! asks for a summary grounded in those results in the detected language.
//!
//! Invocation arguments win per key over accumulated preferences: the
//! current turn's explicit intent is more specific than history.

use advisor_catalog::{CatalogIndex, CpuBrand, SearchQuery, SortBy};
use advisor_core::{Language, Message, ToolCall, ToolDefinition, Turn, TurnRole};
use advisor_llm::{ChatBackend, LlmError, ToolBuilder};

use crate::brands::BrandResolver;
use crate::preferences::PreferenceSet;
use crate::prompts;
use crate::AgentError;

/// Build the `product_search` tool definition. Brand stays a free string
/// so typos reach the fuzzy resolver instead of being rejected upstream.
pub fn search_tool() -> ToolDefinition {
    ToolBuilder::new(
        "product_search",
        "Search the product catalog with structured filters",
    )
    .param(
        "query",
        "string",
        "General search query for the product name, model, or keywords",
        false,
    )
    .param("category", "string", "Product category, e.g. 'laptop'", false)
    .param("brand", "string", "Product brand, e.g. 'Lenovo', 'Dell'", false)
    .param("min_price", "integer", "Minimum price", false)
    .param("max_price", "integer", "Maximum price, inclusive", false)
    .param("min_ram_gb", "integer", "Minimum RAM size in GB", false)
    .param("min_storage_gb", "integer", "Minimum storage size in GB", false)
    .param("cpu_brand", "string", "CPU maker", false)
    .string_enum("cpu_brand", &["intel", "amd", "apple"])
    .param(
        "gpu",
        "string",
        "GPU requirement: 'dedicated' for any discrete card, or a model substring",
        false,
    )
    .string_array(
        "availability",
        "Allowed availability states",
        &["in_stock", "out_of_stock", "limited", "preorder"],
    )
    .param("sort_by", "string", "Result ordering", false)
    .string_enum("sort_by", &["relevance", "price_asc", "price_desc"])
    .param("limit", "integer", "Maximum number of results", false)
    .build()
}

fn parse_sort(token: &str) -> Option<SortBy> {
    match token {
        "relevance" => Some(SortBy::Relevance),
        "price_asc" => Some(SortBy::PriceAsc),
        "price_desc" => Some(SortBy::PriceDesc),
        _ => None,
    }
}

/// Build the effective query for one invocation: the preference set is
/// merged underneath the invocation's own arguments.
pub fn build_query(
    call: &ToolCall,
    preferences: &PreferenceSet,
    resolver: &BrandResolver,
) -> SearchQuery {
    let brand = call
        .get_str("brand")
        .map(str::to_string)
        .or_else(|| preferences.brand.clone())
        .map(|b| resolver.resolve(&b).map(str::to_string).unwrap_or(b));

    let gpu = call.get_str("gpu").map(str::to_string).or_else(|| {
        (preferences.needs_dedicated_gpu == Some(true)).then(|| "dedicated".to_string())
    });

    let availability = call
        .arguments
        .get("availability")
        .and_then(|v| v.as_array())
        .map(|states| {
            states
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        });

    SearchQuery {
        query: call.get_str("query").map(str::to_string),
        category: call.get_str("category").map(str::to_string),
        brand,
        min_price: call.get_i64("min_price").or(preferences.min_price),
        max_price: call.get_i64("max_price").or(preferences.max_price),
        min_ram_gb: call.get_i64("min_ram_gb").or(preferences.min_ram_gb),
        min_storage_gb: call.get_i64("min_storage_gb").or(preferences.min_storage_gb),
        cpu_brand: call
            .get_str("cpu_brand")
            .and_then(CpuBrand::parse)
            .or(preferences.cpu_brand),
        gpu,
        availability,
        limit: call.get_i64("limit"),
        sort_by: call.get_str("sort_by").and_then(parse_sort).unwrap_or_default(),
    }
}

/// Runs the two-phase protocol for one turn.
pub struct ToolCallBridge<'a> {
    backend: &'a dyn ChatBackend,
    catalog: &'a CatalogIndex,
    tool: ToolDefinition,
    resolver: BrandResolver,
}

impl<'a> ToolCallBridge<'a> {
    pub fn new(backend: &'a dyn ChatBackend, catalog: &'a CatalogIndex) -> Self {
        Self {
            backend,
            catalog,
            tool: search_tool(),
            resolver: BrandResolver::new(catalog.all_brands()),
        }
    }

    /// Run one turn over the bounded history. Returns the final answer
    /// text; any service error aborts the turn and surfaces as `Err`.
    pub async fn run(
        &self,
        system_prompt: &str,
        history: &[Turn],
        preferences: &PreferenceSet,
        language: Language,
    ) -> Result<String, AgentError> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(system_prompt));
        for turn in history {
            messages.push(match turn.role {
                TurnRole::User => Message::user(turn.content.clone()),
                TurnRole::Assistant => Message::assistant(turn.content.clone()),
            });
        }

        let outcome = self
            .backend
            .generate_with_tools(&messages, std::slice::from_ref(&self.tool))
            .await?;

        if !outcome.has_tool_calls() {
            return Ok(outcome.text.trim().to_string());
        }

        messages.push(Message::assistant_with_tool_calls(
            outcome.text.clone(),
            outcome.tool_calls.clone(),
        ));

        for call in &outcome.tool_calls {
            let query = build_query(call, preferences, &self.resolver);
            let results = self.catalog.search(&query);
            tracing::debug!(
                call_id = %call.id,
                results = results.len(),
                "Executed catalog search"
            );
            let results_json = serde_json::to_string(&results)
                .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
            messages.push(Message::tool(results_json, call.id.clone()));
        }

        messages.push(Message::user(prompts::summarize_instruction(language)));

        let summary = self.backend.generate(&messages).await?;
        Ok(summary.text.trim().to_string())
    }
}
