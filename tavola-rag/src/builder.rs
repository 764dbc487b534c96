//! Turning restaurant records into retrievable documents.
//!
//! [`DocumentBuilder`] is a pure function over [`RestaurantRecord`]s: given
//! identical input it produces identical ids, content, and metadata every
//! time. Four document kinds come out of one record: a `restaurant_info`
//! overview, one `menu_category` per distinct category string, one
//! `menu_item` per named menu row, and at most one `reviews` document.

use std::collections::HashMap;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde_json::json;
use tracing::debug;

use crate::document::{Document, DocumentKind, PriceCategory};
use crate::error::{RagError, Result};
use crate::record::{MenuItem, RestaurantRecord};

/// Label used for menu rows whose category is empty or missing.
const UNCATEGORIZED: &str = "Uncategorized";

/// How many reviews are rendered into the reviews document's content.
///
/// The `review_count` metadata field still reports the full total, so a
/// restaurant with 40 reviews renders 10 but reports 40. Downstream
/// consumers rely on that asymmetry.
const REVIEWS_PER_DOCUMENT: usize = 10;

static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Rs\s*(\d+(?:\.\d+)?)").expect("valid price regex"));

/// Builds retrievable [`Document`]s from [`RestaurantRecord`]s.
///
/// Stateless; construct once and reuse across records. Collisions between
/// document ids resolve last-write-wins in an insertion-ordered map, so
/// two menu items normalizing to the same id yield a single document
/// holding the later item's content.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentBuilder;

impl DocumentBuilder {
    /// Create a new document builder.
    pub fn new() -> Self {
        Self
    }

    /// Build the document set for one restaurant.
    ///
    /// Documents come back in build order: restaurant info, menu
    /// categories in first-appearance order, menu items in row order,
    /// then reviews.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidRecord`] if the restaurant name is
    /// empty or whitespace-only, since every document id derives from it.
    pub fn build(&self, record: &RestaurantRecord) -> Result<Vec<Document>> {
        let mut by_id: IndexMap<String, Document> = IndexMap::new();
        self.build_into(record, &mut by_id)?;
        Ok(by_id.into_values().collect())
    }

    /// Build documents for a whole corpus of restaurants.
    ///
    /// Id collisions across restaurants resolve the same way as within
    /// one: last write wins.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidRecord`] on the first record with an
    /// empty name; no partial output is returned.
    pub fn build_all(&self, records: &[RestaurantRecord]) -> Result<Vec<Document>> {
        let mut by_id: IndexMap<String, Document> = IndexMap::new();
        for record in records {
            self.build_into(record, &mut by_id)?;
        }
        Ok(by_id.into_values().collect())
    }

    fn build_into(
        &self,
        record: &RestaurantRecord,
        by_id: &mut IndexMap<String, Document>,
    ) -> Result<()> {
        if record.name.trim().is_empty() {
            return Err(RagError::InvalidRecord(
                "restaurant name is empty; document ids cannot be derived".to_string(),
            ));
        }
        let name = record.name.trim();

        let mut insert = |doc: Document| {
            if by_id.contains_key(&doc.id) {
                debug!(id = %doc.id, "document id collision, overwriting");
            }
            by_id.insert(doc.id.clone(), doc);
        };

        insert(self.restaurant_info_doc(name, record));

        // Group menu rows by exact category string, first-appearance order.
        let mut by_category: IndexMap<&str, Vec<&MenuItem>> = IndexMap::new();
        for item in &record.menu_items {
            if item.name.is_empty() {
                continue;
            }
            by_category.entry(item.category.as_str()).or_default().push(item);
        }

        for (&category, items) in &by_category {
            let label = if category.is_empty() { UNCATEGORIZED } else { category };
            insert(self.menu_category_doc(name, label, items));
        }

        for item in &record.menu_items {
            if item.name.is_empty() {
                continue;
            }
            insert(self.menu_item_doc(name, item));
        }

        if !record.reviews.is_empty() {
            insert(self.reviews_doc(name, record));
        }

        Ok(())
    }

    fn restaurant_info_doc(&self, name: &str, record: &RestaurantRecord) -> Document {
        let content = format!(
            "Restaurant: {name}\n\
             Cuisine: {}\n\
             Location: {}\n\
             Price range: {}\n\
             Opening hours: {}\n\
             Rating: {} from {} reviews\n\
             Phone: {}",
            record.cuisine,
            record.locality,
            record.price_range,
            record.opening_hours,
            record.rating,
            record.rating_count,
            record.phone,
        );

        let mut metadata = HashMap::new();
        metadata.insert("restaurant".to_string(), json!(name));
        metadata.insert("cuisine".to_string(), json!(record.cuisine));
        metadata.insert("location".to_string(), json!(record.locality));
        metadata.insert("price_range".to_string(), json!(record.price_range));

        Document {
            id: derive_id(&format!("restaurant-{name}")),
            kind: DocumentKind::RestaurantInfo,
            content,
            metadata,
        }
    }

    fn menu_category_doc(
        &self,
        name: &str,
        label: &str,
        items: &[&MenuItem],
    ) -> Document {
        let items_text = items
            .iter()
            .map(|item| {
                format!(
                    "- {}: {} Price: {}. Dietary info: {}. Tags: {}",
                    item.name, item.description, item.price, item.dietary_info, item.tags
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let content = format!("Restaurant: {name}\nMenu category: {label}\nItems:\n{items_text}");

        let mut metadata = HashMap::new();
        metadata.insert("restaurant".to_string(), json!(name));
        metadata.insert("category".to_string(), json!(label));
        metadata.insert("item_count".to_string(), json!(items.len()));

        Document {
            id: derive_id(&format!("menu-{name}-{label}")),
            kind: DocumentKind::MenuCategory,
            content,
            metadata,
        }
    }

    fn menu_item_doc(&self, name: &str, item: &MenuItem) -> Document {
        let price_value = extract_price_value(&item.price);
        let price_category = PriceCategory::from_price(price_value);

        let content = format!(
            "Restaurant: {name}\n\
             Menu item: {}\n\
             Description: {}\n\
             Category: {}\n\
             Price: {}\n\
             Dietary info: {}\n\
             Tags: {}",
            item.name, item.description, item.category, item.price, item.dietary_info, item.tags,
        );

        let mut metadata = HashMap::new();
        metadata.insert("restaurant".to_string(), json!(name));
        metadata.insert("name".to_string(), json!(item.name));
        metadata.insert("category".to_string(), json!(item.category));
        metadata.insert("price_value".to_string(), json!(price_value));
        metadata.insert("price_category".to_string(), json!(price_category.as_str()));
        metadata.insert("dietary_info".to_string(), json!(item.dietary_info));

        Document {
            id: derive_id(&format!("menu-item-{name}-{}", item.name)),
            kind: DocumentKind::MenuItem,
            content,
            metadata,
        }
    }

    fn reviews_doc(&self, name: &str, record: &RestaurantRecord) -> Document {
        let reviews_text = record
            .reviews
            .iter()
            .take(REVIEWS_PER_DOCUMENT)
            .map(|review| {
                format!("- {} (Rating: {}): {}", review.author, review.rating, review.text)
            })
            .collect::<Vec<_>>()
            .join("\n");

        let content = format!("Restaurant: {name}\nReviews:\n{reviews_text}");

        let mut metadata = HashMap::new();
        metadata.insert("restaurant".to_string(), json!(name));
        metadata.insert("review_count".to_string(), json!(record.reviews.len()));

        Document {
            id: derive_id(&format!("reviews-{name}")),
            kind: DocumentKind::Reviews,
            content,
            metadata,
        }
    }
}

/// Normalize a raw id string: trim, lowercase, runs of whitespace to a
/// single hyphen.
fn derive_id(raw: &str) -> String {
    let mut id = String::with_capacity(raw.len());
    let mut in_whitespace = false;
    for ch in raw.trim().chars() {
        if ch.is_whitespace() {
            in_whitespace = true;
        } else {
            if in_whitespace {
                id.push('-');
                in_whitespace = false;
            }
            for lower in ch.to_lowercase() {
                id.push(lower);
            }
        }
    }
    id
}

/// Extract a numeric price from price text like `"Rs 795"` or `"Rs150.50"`.
fn extract_price_value(price: &str) -> Option<f64> {
    PRICE_RE.captures(price).and_then(|caps| caps.get(1)).and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_id_collapses_whitespace_runs() {
        assert_eq!(derive_id("  Cafe   X \t Deli "), "cafe-x-deli");
        assert_eq!(derive_id("restaurant-Cafe X"), "restaurant-cafe-x");
    }

    #[test]
    fn extract_price_value_matches_rs_amounts() {
        assert_eq!(extract_price_value("Rs 795"), Some(795.0));
        assert_eq!(extract_price_value("Rs150.50"), Some(150.5));
        assert_eq!(extract_price_value("₹ 300"), None);
        assert_eq!(extract_price_value(""), None);
    }

    #[test]
    fn price_categories_bucket_at_boundaries() {
        assert_eq!(PriceCategory::from_price(None), PriceCategory::Unknown);
        assert_eq!(PriceCategory::from_price(Some(200.0)), PriceCategory::Budget);
        assert_eq!(PriceCategory::from_price(Some(200.5)), PriceCategory::Moderate);
        assert_eq!(PriceCategory::from_price(Some(500.0)), PriceCategory::Moderate);
        assert_eq!(PriceCategory::from_price(Some(800.0)), PriceCategory::Premium);
        assert_eq!(PriceCategory::from_price(Some(801.0)), PriceCategory::Luxury);
    }
}
