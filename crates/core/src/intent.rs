//! User intent classification targets
//!
//! The intent set is closed: every variant must be handled when selecting a
//! prompt profile, so adding an intent is a compile-time visible change.

use serde::{Deserialize, Serialize};

/// The user's primary goal for the current turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Find or select products by filters (price, specs, brand, stock)
    SearchSelection,
    /// Details about a specific product or model
    InformationDetails,
    /// Compare two or more products
    Comparison,
    /// Assortment, brands, availability in general. Also the safe default
    /// when classification fails: it routes to the most permissive handling.
    #[default]
    GeneralInquiry,
}

impl Intent {
    /// All variants, in a fixed order (used to build the classifier schema)
    pub const ALL: [Intent; 4] = [
        Intent::SearchSelection,
        Intent::InformationDetails,
        Intent::Comparison,
        Intent::GeneralInquiry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::SearchSelection => "search_selection",
            Intent::InformationDetails => "information_details",
            Intent::Comparison => "comparison",
            Intent::GeneralInquiry => "general_inquiry",
        }
    }

    /// Parse a classifier payload value; unknown strings are rejected so the
    /// caller can count the attempt as failed rather than silently default.
    pub fn from_str_strict(s: &str) -> Option<Self> {
        match s {
            "search_selection" => Some(Intent::SearchSelection),
            "information_details" => Some(Intent::InformationDetails),
            "comparison" => Some(Intent::Comparison),
            "general_inquiry" => Some(Intent::GeneralInquiry),
            _ => None,
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
