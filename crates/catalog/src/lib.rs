//! Catalog index and retrieval engine
//!
//! Loads a product catalog (products with nested purchasable variants),
//! flattens it into an immutable variant-level index, and evaluates
//! structured search queries against it: exact filters, heuristic CPU/GPU
//! classification, soft free-text scoring, ranking, and a single-step
//! fallback relaxation when filters over-constrain.
//!
//! The index is built once and read-only afterwards; it can be shared
//! freely across conversations without locking.

pub mod index;
pub mod model;
pub mod search;

pub use index::CatalogIndex;
pub use model::{Availability, FlatVariant, ProductRecord, VariantRecord};
pub use search::{CpuBrand, SearchQuery, SortBy, DEFAULT_LIMIT};

use thiserror::Error;

/// Catalog loading errors
///
/// Loading failures degrade to an empty index at the call site; queries
/// against an empty index legitimately return zero results.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog source unreadable: {0}")]
    Io(#[from] std::io::Error),

    #[error("Catalog source malformed: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<CatalogError> for advisor_core::Error {
    fn from(err: CatalogError) -> Self {
        advisor_core::Error::Catalog(err.to_string())
    }
}
