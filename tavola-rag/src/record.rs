//! Input types supplied by the ingestion collaborator.
//!
//! A [`RestaurantRecord`] is the raw, already-scraped shape of one
//! restaurant: basic info fields, menu rows in source order, and reviews
//! in arrival order. Records are immutable once handed to the
//! [`DocumentBuilder`](crate::builder::DocumentBuilder); cleaning and
//! category normalization happen upstream and are not re-done here.

use serde::{Deserialize, Serialize};

/// One restaurant as delivered by the ingestion pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RestaurantRecord {
    /// Restaurant name. The only mandatory field; document ids derive from it.
    pub name: String,
    /// Cuisine description, e.g. "Italian, Cafe".
    #[serde(default)]
    pub cuisine: String,
    /// Neighbourhood or locality.
    #[serde(default)]
    pub locality: String,
    /// Price range as displayed by the source site.
    #[serde(default)]
    pub price_range: String,
    /// Opening hours text.
    #[serde(default)]
    pub opening_hours: String,
    /// Contact phone number.
    #[serde(default)]
    pub phone: String,
    /// Aggregate rating as displayed, e.g. "4.2".
    #[serde(default)]
    pub rating: String,
    /// Number of ratings behind the aggregate.
    #[serde(default)]
    pub rating_count: String,
    /// Menu rows in the order the source listed them.
    #[serde(default)]
    pub menu_items: Vec<MenuItem>,
    /// Reviews in arrival order.
    #[serde(default)]
    pub reviews: Vec<Review>,
}

/// One menu row. Rows with an empty `name` are skipped by the builder.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MenuItem {
    /// Item name.
    #[serde(default)]
    pub name: String,
    /// Item description.
    #[serde(default)]
    pub description: String,
    /// Category label, exactly as supplied. Empty means uncategorized.
    #[serde(default)]
    pub category: String,
    /// Price text as displayed, e.g. "Rs 150".
    #[serde(default)]
    pub price: String,
    /// Dietary tag, e.g. "Veg" / "Non-Veg".
    #[serde(default)]
    pub dietary_info: String,
    /// Free-text tags.
    #[serde(default)]
    pub tags: String,
}

/// One customer review.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Review {
    /// Review author.
    #[serde(default)]
    pub author: String,
    /// Rating the author gave.
    #[serde(default)]
    pub rating: String,
    /// Review body.
    #[serde(default)]
    pub text: String,
}
