//! Immutable variant-level catalog index

use std::collections::BTreeSet;
use std::path::Path;

use crate::model::{FlatVariant, ProductRecord};
use crate::CatalogError;

/// Flattened, read-only view over the catalog.
///
/// Built once from product records; every variant is annotated with its
/// parent product's identity so queries operate on a single flat list.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    variants: Vec<FlatVariant>,
    brands: Vec<String>,
}

impl CatalogIndex {
    /// Build the index from already-parsed product records
    pub fn from_records(products: Vec<ProductRecord>) -> Self {
        let mut variants = Vec::new();
        let mut brand_set: BTreeSet<String> = BTreeSet::new();
        for product in &products {
            brand_set.insert(product.brand.clone());
            for variant in &product.variants {
                variants.push(FlatVariant::from_parts(product, variant));
            }
        }
        Self {
            variants,
            brands: brand_set.into_iter().collect(),
        }
    }

    /// Parse a JSON array of products and build the index
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let products: Vec<ProductRecord> = serde_json::from_str(json)?;
        Ok(Self::from_records(products))
    }

    /// Load the catalog from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Load the catalog, degrading to an empty index on failure.
    ///
    /// An empty index answers every query with zero results, which the
    /// conversation layer reports as "nothing found" rather than an error.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(index) => index,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Catalog load failed, starting with empty index");
                Self::default()
            }
        }
    }

    /// All flattened variants, catalog order
    pub fn variants(&self) -> &[FlatVariant] {
        &self.variants
    }

    /// Distinct brand names, sorted, case preserved
    pub fn all_brands(&self) -> &[String] {
        &self.brands
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}
