//! Structured query evaluation: filters, scoring, ranking, fallback
//!
//! The pipeline is strictly ordered; each stage narrows the working set and
//! later stages never see rows already excluded. The free-text query is a
//! soft scorer and never removes rows. When the filtered set comes out
//! empty, one relaxation pass re-runs against the full catalog with only
//! the availability gate, brand equality and a widened price ceiling.

use std::cmp::Reverse;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::index::CatalogIndex;
use crate::model::{Availability, FlatVariant};

/// Default page size when the query gives no usable limit
pub const DEFAULT_LIMIT: usize = 12;

/// Ceiling multiplier applied by the fallback relaxation pass
const RELAXED_CEILING_FACTOR: f64 = 1.10;

/// Result ordering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    Relevance,
    PriceAsc,
    PriceDesc,
}

/// CPU brand class used by the heuristic CPU filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CpuBrand {
    Intel,
    Amd,
    Apple,
}

// Apple silicon descriptions often omit the brand name ("M2 Pro chip")
static APPLE_M_SERIES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bm[1-3]\b").expect("valid literal pattern"));

impl CpuBrand {
    /// Classify a free-text CPU description. Unclassifiable descriptions
    /// return `None` and never match a requested class.
    pub fn classify(description: &str) -> Option<CpuBrand> {
        let lower = description.to_lowercase();
        if lower.contains("intel") {
            Some(CpuBrand::Intel)
        } else if lower.contains("amd") {
            Some(CpuBrand::Amd)
        } else if lower.contains("apple") || APPLE_M_SERIES.is_match(&lower) {
            Some(CpuBrand::Apple)
        } else {
            None
        }
    }

    /// Parse a requested class token ("intel", "amd", "apple"), falling
    /// back to the description heuristics for looser inputs like "m2".
    pub fn parse(token: &str) -> Option<CpuBrand> {
        match token.trim().to_lowercase().as_str() {
            "intel" => Some(CpuBrand::Intel),
            "amd" => Some(CpuBrand::Amd),
            "apple" => Some(CpuBrand::Apple),
            other => CpuBrand::classify(other),
        }
    }
}

/// Structured search request against the catalog index.
///
/// Every filter field is independently optional; a query with no filters
/// returns the whole availability-gated catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free-text query, soft-scored against "brand model sku"
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Exact brand. Fuzzy resolution from user input happens upstream.
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub min_price: Option<i64>,
    #[serde(default)]
    pub max_price: Option<i64>,
    #[serde(default)]
    pub min_ram_gb: Option<i64>,
    #[serde(default)]
    pub min_storage_gb: Option<i64>,
    #[serde(default)]
    pub cpu_brand: Option<CpuBrand>,
    /// Either a discrete-class synonym (dedicated/discrete/nvidia) or a
    /// substring matched against the GPU description
    #[serde(default)]
    pub gpu: Option<String>,
    /// Availability allow-list; unset applies the default gate
    #[serde(default)]
    pub availability: Option<Vec<String>>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub sort_by: SortBy,
}

impl SearchQuery {
    fn effective_limit(&self) -> usize {
        match self.limit {
            Some(n) if n > 0 => n as usize,
            _ => DEFAULT_LIMIT,
        }
    }

    // Malformed bounds are normalized rather than rejected
    fn bound(value: Option<i64>) -> Option<i64> {
        value.filter(|v| *v >= 0)
    }
}

const GATE_DEFAULT: [Availability; 3] = [
    Availability::InStock,
    Availability::Limited,
    Availability::Preorder,
];

fn availability_allowed(allow: &Option<Vec<String>>, availability: Availability) -> bool {
    match allow {
        Some(list) if !list.is_empty() => list
            .iter()
            .any(|entry| entry.trim().eq_ignore_ascii_case(availability.as_str())),
        _ => GATE_DEFAULT.contains(&availability),
    }
}

const DISCRETE_GPU_SYNONYMS: [&str; 3] = ["dedicated", "discrete", "nvidia"];

fn gpu_matches(requested: &str, gpu: &str) -> bool {
    let requested = requested.trim().to_lowercase();
    if DISCRETE_GPU_SYNONYMS.contains(&requested.as_str()) {
        let gpu = gpu.trim();
        !gpu.is_empty() && !gpu.eq_ignore_ascii_case("integrated")
    } else {
        gpu.to_lowercase().contains(&requested)
    }
}

/// Soft free-text score: the number of candidates (whole trimmed query
/// plus each whitespace token) appearing as substrings of
/// "brand model sku", lowercased. Never used to exclude rows.
fn text_score(query: &str, variant: &FlatVariant) -> usize {
    let haystack = format!("{} {} {}", variant.brand, variant.model, variant.sku).to_lowercase();
    let whole = query.trim().to_lowercase();
    if whole.is_empty() {
        return 0;
    }
    let mut score = usize::from(haystack.contains(&whole));
    for token in whole.split_whitespace() {
        if haystack.contains(token) {
            score += 1;
        }
    }
    score
}

impl CatalogIndex {
    /// Evaluate a structured query and return at most `limit` variants.
    pub fn search(&self, query: &SearchQuery) -> Vec<FlatVariant> {
        let min_price = SearchQuery::bound(query.min_price);
        let max_price = SearchQuery::bound(query.max_price);
        let min_ram = SearchQuery::bound(query.min_ram_gb);
        let min_storage = SearchQuery::bound(query.min_storage_gb);

        let mut rows: Vec<&FlatVariant> = self
            .variants()
            .iter()
            .filter(|v| availability_allowed(&query.availability, v.availability))
            .filter(|v| match &query.category {
                Some(category) => v.category.eq_ignore_ascii_case(category.trim()),
                None => true,
            })
            .filter(|v| match &query.brand {
                Some(brand) => v.brand.eq_ignore_ascii_case(brand.trim()),
                None => true,
            })
            .filter(|v| min_price.map_or(true, |min| v.price_usd >= min))
            .filter(|v| max_price.map_or(true, |max| v.price_usd <= max))
            .filter(|v| min_ram.map_or(true, |min| i64::from(v.ram_gb) >= min))
            .filter(|v| min_storage.map_or(true, |min| i64::from(v.storage_gb) >= min))
            .filter(|v| match query.cpu_brand {
                Some(class) => CpuBrand::classify(&v.cpu) == Some(class),
                None => true,
            })
            .filter(|v| match &query.gpu {
                Some(requested) => gpu_matches(requested, &v.gpu),
                None => true,
            })
            .collect();

        if rows.is_empty() {
            rows = self.relaxed_pass(query, max_price);
            if !rows.is_empty() {
                tracing::debug!(results = rows.len(), "Filters relaxed after empty primary pass");
            }
        }

        Self::order(&mut rows, query);
        rows.into_iter()
            .take(query.effective_limit())
            .cloned()
            .collect()
    }

    /// One-shot relaxation: full catalog, availability gate, brand
    /// equality and a widened price ceiling only. Never widened further.
    fn relaxed_pass(&self, query: &SearchQuery, max_price: Option<i64>) -> Vec<&FlatVariant> {
        let ceiling = max_price.map(|max| max as f64 * RELAXED_CEILING_FACTOR);
        self.variants()
            .iter()
            .filter(|v| availability_allowed(&query.availability, v.availability))
            .filter(|v| match &query.brand {
                Some(brand) => v.brand.eq_ignore_ascii_case(brand.trim()),
                None => true,
            })
            .filter(|v| ceiling.map_or(true, |max| v.price_usd as f64 <= max))
            .collect()
    }

    fn order(rows: &mut [&FlatVariant], query: &SearchQuery) {
        // Soft scorer first; a price sort then overrides it entirely
        if let Some(text) = query.query.as_deref() {
            if !text.trim().is_empty() {
                rows.sort_by_key(|v| (Reverse(text_score(text, v)), v.price_usd));
            }
        }
        match query.sort_by {
            SortBy::Relevance => {}
            SortBy::PriceAsc => rows.sort_by(|a, b| {
                a.price_usd
                    .cmp(&b.price_usd)
                    .then_with(|| a.brand.cmp(&b.brand))
                    .then_with(|| a.model.cmp(&b.model))
                    .then_with(|| a.ram_gb.cmp(&b.ram_gb))
            }),
            SortBy::PriceDesc => rows.sort_by(|a, b| {
                b.price_usd
                    .cmp(&a.price_usd)
                    .then_with(|| a.brand.cmp(&b.brand))
                    .then_with(|| a.model.cmp(&b.model))
                    .then_with(|| a.ram_gb.cmp(&b.ram_gb))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ProductRecord, VariantRecord};

    fn variant(
        sku: &str,
        ram: u32,
        storage: u32,
        cpu: &str,
        gpu: &str,
        price: i64,
        availability: Availability,
    ) -> VariantRecord {
        VariantRecord {
            sku: sku.to_string(),
            ram_gb: ram,
            storage_gb: storage,
            storage_type: Some("ssd".to_string()),
            cpu: cpu.to_string(),
            gpu: gpu.to_string(),
            screen_inch: 14.0,
            weight_kg: Some(1.4),
            price_usd: price,
            availability,
            color: "silver".to_string(),
        }
    }

    fn product(id: &str, brand: &str, model: &str, variants: Vec<VariantRecord>) -> ProductRecord {
        ProductRecord {
            id: id.to_string(),
            brand: brand.to_string(),
            model: model.to_string(),
            category: "laptop".to_string(),
            keywords: Vec::new(),
            aliases: Vec::new(),
            variants,
        }
    }

    fn sample_index() -> CatalogIndex {
        CatalogIndex::from_records(vec![
            product(
                "dell-xps-13",
                "Dell",
                "XPS 13",
                vec![variant(
                    "XPS13-16-512",
                    16,
                    512,
                    "Intel Core i7-1360P",
                    "integrated",
                    1299,
                    Availability::InStock,
                )],
            ),
            product(
                "hp-envy-15",
                "HP",
                "Envy 15",
                vec![variant(
                    "ENVY15-32-1024",
                    32,
                    1024,
                    "AMD Ryzen 7 7840HS",
                    "NVIDIA RTX 4060",
                    1450,
                    Availability::InStock,
                )],
            ),
            product(
                "apple-mbp-14",
                "Apple",
                "MacBook Pro 14",
                vec![variant(
                    "MBP14-16-512",
                    16,
                    512,
                    "M2 Pro",
                    "integrated",
                    1999,
                    Availability::Limited,
                )],
            ),
            product(
                "lenovo-tb-14",
                "Lenovo",
                "ThinkBook 14 G3",
                vec![variant(
                    "TB14-8-256",
                    8,
                    256,
                    "AMD Ryzen 5 5500U",
                    "integrated",
                    649,
                    Availability::OutOfStock,
                )],
            ),
        ])
    }

    fn query() -> SearchQuery {
        SearchQuery::default()
    }

    #[test]
    fn test_default_availability_gate_excludes_out_of_stock() {
        let index = sample_index();
        let results = index.search(&query());
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|v| v.availability != Availability::OutOfStock));
    }

    #[test]
    fn test_explicit_availability_overrides_gate() {
        let index = sample_index();
        let results = index.search(&SearchQuery {
            availability: Some(vec!["Out_Of_Stock".to_string()]),
            ..query()
        });
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].sku, "TB14-8-256");
    }

    #[test]
    fn test_price_and_ram_filters() {
        let index = sample_index();
        // Under $1500 with at least 32 GB RAM matches only the Envy
        let results = index.search(&SearchQuery {
            max_price: Some(1500),
            min_ram_gb: Some(32),
            ..query()
        });
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].model, "Envy 15");
    }

    #[test]
    fn test_price_bounds_inclusive() {
        let index = sample_index();
        let results = index.search(&SearchQuery {
            min_price: Some(1299),
            max_price: Some(1299),
            ..query()
        });
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].model, "XPS 13");
    }

    #[test]
    fn test_brand_equality_case_insensitive() {
        let index = sample_index();
        let results = index.search(&SearchQuery {
            brand: Some("dell".to_string()),
            ..query()
        });
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].brand, "Dell");
    }

    #[test]
    fn test_storage_floor() {
        let index = sample_index();
        let results = index.search(&SearchQuery {
            min_storage_gb: Some(1024),
            ..query()
        });
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].sku, "ENVY15-32-1024");
    }

    #[test]
    fn test_cpu_classification() {
        assert_eq!(CpuBrand::classify("Intel Core i5-1235U"), Some(CpuBrand::Intel));
        assert_eq!(CpuBrand::classify("AMD Ryzen 7"), Some(CpuBrand::Amd));
        assert_eq!(CpuBrand::classify("Apple Silicon"), Some(CpuBrand::Apple));
        assert_eq!(CpuBrand::classify("M2 Pro"), Some(CpuBrand::Apple));
        assert_eq!(CpuBrand::classify("m3"), Some(CpuBrand::Apple));
        // "m10" and embedded "m2" must not classify as Apple silicon
        assert_eq!(CpuBrand::classify("Snapdragon m10x"), None);
        assert_eq!(CpuBrand::classify("Qualcomm 8cx"), None);
    }

    #[test]
    fn test_cpu_filter_unknown_never_matches() {
        let index = CatalogIndex::from_records(vec![product(
            "x",
            "Acme",
            "Board",
            vec![variant(
                "ACME-1",
                8,
                256,
                "Mystery SoC",
                "",
                500,
                Availability::InStock,
            )],
        )]);
        let results = index.search(&SearchQuery {
            cpu_brand: Some(CpuBrand::Intel),
            max_price: None,
            ..SearchQuery::default()
        });
        // Relaxation drops the CPU filter, so the row comes back then
        assert_eq!(results.len(), 1);
        // With a brand mismatch too, nothing survives either pass
        let none = index.search(&SearchQuery {
            cpu_brand: Some(CpuBrand::Intel),
            brand: Some("Dell".to_string()),
            ..SearchQuery::default()
        });
        assert!(none.is_empty());
    }

    #[test]
    fn test_gpu_discrete_synonyms() {
        let index = sample_index();
        for synonym in ["dedicated", "discrete", "NVIDIA"] {
            let results = index.search(&SearchQuery {
                gpu: Some(synonym.to_string()),
                ..query()
            });
            assert_eq!(results.len(), 1, "synonym {synonym}");
            assert_eq!(results[0].sku, "ENVY15-32-1024");
        }
    }

    #[test]
    fn test_gpu_substring_match() {
        let index = sample_index();
        let results = index.search(&SearchQuery {
            gpu: Some("rtx 4060".to_string()),
            ..query()
        });
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].sku, "ENVY15-32-1024");
    }

    #[test]
    fn test_free_text_never_filters() {
        let index = sample_index();
        let without = index.search(&query());
        let with = index.search(&SearchQuery {
            query: Some("zebra unicorn gadget".to_string()),
            ..query()
        });
        assert_eq!(with.len(), without.len());
    }

    #[test]
    fn test_free_text_ranks_matches_first() {
        let index = sample_index();
        let results = index.search(&SearchQuery {
            query: Some("Dell XPS".to_string()),
            ..query()
        });
        assert_eq!(results[0].model, "XPS 13");
    }

    #[test]
    fn test_score_ties_break_by_price_ascending() {
        let index = sample_index();
        // No candidate matches anything, so all scores are zero
        let results = index.search(&SearchQuery {
            query: Some("qqq".to_string()),
            ..query()
        });
        let prices: Vec<i64> = results.iter().map(|v| v.price_usd).collect();
        let mut sorted = prices.clone();
        sorted.sort_unstable();
        assert_eq!(prices, sorted);
    }

    #[test]
    fn test_sort_price_asc_and_desc() {
        let index = sample_index();
        let asc = index.search(&SearchQuery {
            sort_by: SortBy::PriceAsc,
            ..query()
        });
        assert_eq!(asc[0].price_usd, 1299);
        assert_eq!(asc[2].price_usd, 1999);

        let desc = index.search(&SearchQuery {
            sort_by: SortBy::PriceDesc,
            ..query()
        });
        assert_eq!(desc[0].price_usd, 1999);
        assert_eq!(desc[2].price_usd, 1299);
    }

    #[test]
    fn test_price_sort_overrides_text_scoring() {
        let index = sample_index();
        let results = index.search(&SearchQuery {
            query: Some("MacBook".to_string()),
            sort_by: SortBy::PriceAsc,
            ..query()
        });
        assert_eq!(results[0].price_usd, 1299);
    }

    #[test]
    fn test_fallback_relaxes_price_ceiling() {
        let index = CatalogIndex::from_records(vec![product(
            "dell-xps-13",
            "Dell",
            "XPS 13",
            vec![variant(
                "XPS13-16-512",
                16,
                512,
                "Intel Core i7",
                "integrated",
                1099,
                Availability::InStock,
            )],
        )]);
        // $1099 is over the $1000 ceiling but within the 10% relaxation
        let results = index.search(&SearchQuery {
            max_price: Some(1000),
            ..query()
        });
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].price_usd, 1099);
    }

    #[test]
    fn test_fallback_ceiling_is_bounded() {
        let index = CatalogIndex::from_records(vec![product(
            "apple-mbp-14",
            "Apple",
            "MacBook Pro 14",
            vec![variant(
                "MBP14-16-512",
                16,
                512,
                "M2 Pro",
                "integrated",
                1999,
                Availability::InStock,
            )],
        )]);
        // $1999 is outside 1000 * 1.10; relaxation never widens twice
        let results = index.search(&SearchQuery {
            max_price: Some(1000),
            ..query()
        });
        assert!(results.is_empty());
    }

    #[test]
    fn test_fallback_not_triggered_when_results_exist() {
        let index = sample_index();
        let results = index.search(&SearchQuery {
            max_price: Some(1300),
            ..query()
        });
        assert_eq!(results.len(), 1);
        assert!(results.iter().all(|v| v.price_usd <= 1300));
    }

    #[test]
    fn test_fallback_keeps_brand_and_availability() {
        let index = sample_index();
        // Lenovo exists but is out of stock; relaxation keeps the gate
        let results = index.search(&SearchQuery {
            brand: Some("Lenovo".to_string()),
            max_price: Some(100),
            ..query()
        });
        assert!(results.is_empty());
    }

    #[test]
    fn test_negative_bounds_and_limit_normalized() {
        let index = sample_index();
        let results = index.search(&SearchQuery {
            min_price: Some(-5),
            max_price: Some(-1),
            min_ram_gb: Some(-16),
            limit: Some(-3),
            ..query()
        });
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_limit_truncates() {
        let index = sample_index();
        let results = index.search(&SearchQuery {
            limit: Some(2),
            ..query()
        });
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_empty_catalog_returns_empty() {
        let index = CatalogIndex::default();
        assert!(index.search(&query()).is_empty());
    }

    #[test]
    fn test_cpu_brand_parse_tokens() {
        assert_eq!(CpuBrand::parse("Intel"), Some(CpuBrand::Intel));
        assert_eq!(CpuBrand::parse(" amd "), Some(CpuBrand::Amd));
        assert_eq!(CpuBrand::parse("m2"), Some(CpuBrand::Apple));
        assert_eq!(CpuBrand::parse("snapdragon"), None);
    }
}
