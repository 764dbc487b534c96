//! Data types for retrievable documents.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The atomic retrievable unit.
///
/// `content` is the exact text handed to the embedder at build time and
/// concatenated into the generation context at query time. `id` is
/// deterministically derived from the restaurant name and document kind,
/// so rebuilding from identical records yields identical ids.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// What kind of document this is.
    pub kind: DocumentKind,
    /// Newline-delimited "Field: value" text.
    pub content: String,
    /// Kind-dependent scalar metadata.
    pub metadata: HashMap<String, serde_json::Value>,
}

/// The four document kinds produced per restaurant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// One per restaurant: basic info fields.
    RestaurantInfo,
    /// One per distinct menu category present among the menu rows.
    MenuCategory,
    /// One per menu row with a non-empty name.
    MenuItem,
    /// At most one per restaurant, rendering the first 10 reviews.
    Reviews,
}

/// Coarse price bucket attached to `menu_item` metadata.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PriceCategory {
    /// No numeric price could be extracted.
    Unknown,
    /// Up to 200.
    Budget,
    /// 201–500.
    Moderate,
    /// 501–800.
    Premium,
    /// Above 800.
    Luxury,
}

impl PriceCategory {
    /// Bucket a numeric price value. `None` maps to [`PriceCategory::Unknown`].
    pub fn from_price(price: Option<f64>) -> Self {
        match price {
            None => Self::Unknown,
            Some(p) if p <= 200.0 => Self::Budget,
            Some(p) if p <= 500.0 => Self::Moderate,
            Some(p) if p <= 800.0 => Self::Premium,
            Some(_) => Self::Luxury,
        }
    }

    /// The label stored in document metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Budget => "Budget",
            Self::Moderate => "Moderate",
            Self::Premium => "Premium",
            Self::Luxury => "Luxury",
        }
    }
}
