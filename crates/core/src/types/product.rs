//! Catalog product as delivered by the backend.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ProductId;

/// A purchasable catalog entry.
///
/// Immutable once fetched. The optional fields are only sent by one of the
/// backends and are rendered when present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Decimal>,
}

impl Product {
    /// Image shown when the backend sends none.
    pub const DEFAULT_IMAGE: &'static str = "/static/img/default-product.svg";

    /// Image URL to render, falling back to [`Self::DEFAULT_IMAGE`].
    #[must_use]
    pub fn image_or_default(&self) -> &str {
        let image = self.image.trim();
        if image.is_empty() {
            Self::DEFAULT_IMAGE
        } else {
            image
        }
    }

    /// `true` when the backend reports no stock left.
    ///
    /// Products without a stock figure are always considered available.
    #[must_use]
    pub const fn is_sold_out(&self) -> bool {
        matches!(self.stock, Some(0))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_article() {
        let json = r#"{"id": 3, "name": "Smartphone Galaxy S24", "price": 799.99,
                       "image": "", "description": "Das neueste Smartphone"}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id.as_str(), "3");
        assert_eq!(product.price, Decimal::new(79999, 2));
        assert_eq!(product.image_or_default(), Product::DEFAULT_IMAGE);
        assert!(product.category.is_none());
        assert!(!product.is_sold_out());
    }

    #[test]
    fn test_deserialize_full_product() {
        let json = r#"{"id": "p-1", "name": "Router", "price": "129.00",
                       "image": "https://cdn.example.com/r.png", "description": "WLAN",
                       "category": "Network", "stock": 0, "rating": 4.5}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.category.as_deref(), Some("Network"));
        assert_eq!(product.image_or_default(), "https://cdn.example.com/r.png");
        assert_eq!(product.rating, Some(Decimal::new(45, 1)));
        assert!(product.is_sold_out());
    }

    #[test]
    fn test_missing_description_defaults_to_empty() {
        let json = r#"{"id": 1, "name": "Cable", "price": 5}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.description, "");
    }
}
