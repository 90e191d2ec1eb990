//! Products

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Product identifier, owned by the external catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(Uuid);

impl ProductId {
    /// Wraps an existing catalog identifier.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying identifier.
    #[must_use]
    pub const fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// Denormalized product capture taken when a line is added to a cart.
///
/// The cart never holds a live catalog reference; it keeps this snapshot so
/// it renders correctly even if the product changes or disappears later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    /// Catalog identifier of the product.
    pub id: ProductId,

    /// Display name at capture time.
    pub name: String,

    /// Stock-keeping unit at capture time.
    pub sku: String,

    /// Short description, if the catalog had one.
    pub description: Option<String>,

    /// Image URL, if the catalog had one.
    pub image_url: Option<String>,

    /// List price at capture time.
    pub price: Decimal,

    /// Promotional price at capture time, if any.
    pub discounted_price: Option<Decimal>,
}

impl ProductSnapshot {
    /// Normalizes the optional display fields once, at capture time.
    ///
    /// Blank descriptions and image URLs collapse to [`None`] so consumers
    /// never re-derive fallbacks at render time.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.description = self.description.filter(|d| !d.trim().is_empty());
        self.image_url = self.image_url.filter(|u| !u.trim().is_empty());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(description: Option<&str>, image_url: Option<&str>) -> ProductSnapshot {
        ProductSnapshot {
            id: ProductId::from_uuid(Uuid::now_v7()),
            name: "Widget".to_string(),
            sku: "W-100".to_string(),
            description: description.map(str::to_string),
            image_url: image_url.map(str::to_string),
            price: Decimal::from(10),
            discounted_price: None,
        }
    }

    #[test]
    fn normalized_drops_blank_optional_fields() {
        let product = snapshot(Some("   "), Some("")).normalized();

        assert_eq!(product.description, None);
        assert_eq!(product.image_url, None);
    }

    #[test]
    fn normalized_keeps_populated_fields() {
        let product = snapshot(Some("A widget"), Some("https://img/w.png")).normalized();

        assert_eq!(product.description.as_deref(), Some("A widget"));
        assert_eq!(product.image_url.as_deref(), Some("https://img/w.png"));
    }
}
