//! Catalog source records and the flattened variant view

use serde::{Deserialize, Serialize};

/// Availability state of a purchasable variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    InStock,
    OutOfStock,
    Limited,
    Preorder,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::InStock => "in_stock",
            Availability::OutOfStock => "out_of_stock",
            Availability::Limited => "limited",
            Availability::Preorder => "preorder",
        }
    }
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One purchasable SKU as it appears in the catalog source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantRecord {
    pub sku: String,
    pub ram_gb: u32,
    pub storage_gb: u32,
    #[serde(default)]
    pub storage_type: Option<String>,
    pub cpu: String,
    pub gpu: String,
    pub screen_inch: f64,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    pub price_usd: i64,
    pub availability: Availability,
    pub color: String,
}

/// A product grouping many variants, as it appears in the catalog source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: String,
    pub brand: String,
    pub model: String,
    pub category: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub variants: Vec<VariantRecord>,
}

/// Variant-level search result: a variant annotated with its parent
/// product's identity. Immutable once the index is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatVariant {
    pub product_id: String,
    pub brand: String,
    pub model: String,
    pub category: String,
    pub sku: String,
    pub ram_gb: u32,
    pub storage_gb: u32,
    #[serde(default)]
    pub storage_type: Option<String>,
    pub cpu: String,
    pub gpu: String,
    pub screen_inch: f64,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    pub price_usd: i64,
    pub availability: Availability,
    pub color: String,
}

impl FlatVariant {
    /// Build the flattened view of one variant under its parent product
    pub fn from_parts(product: &ProductRecord, variant: &VariantRecord) -> Self {
        Self {
            product_id: product.id.clone(),
            brand: product.brand.clone(),
            model: product.model.clone(),
            category: product.category.clone(),
            sku: variant.sku.clone(),
            ram_gb: variant.ram_gb,
            storage_gb: variant.storage_gb,
            storage_type: variant.storage_type.clone(),
            cpu: variant.cpu.clone(),
            gpu: variant.gpu.clone(),
            screen_inch: variant.screen_inch,
            weight_kg: variant.weight_kg,
            price_usd: variant.price_usd,
            availability: variant.availability,
            color: variant.color.clone(),
        }
    }
}
