//! Cart aggregate

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{pricing::unit_price, products::{ProductId, ProductSnapshot}};

/// Errors raised by cart mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// Quantities must be at least one.
    #[error("quantity must be at least one")]
    InvalidQuantity,

    /// No line with the given identifier exists in the cart.
    #[error("line not found")]
    UnknownLine,
}

/// Opaque line identifier, generated client-side and stable for the life of
/// the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(Uuid);

impl LineId {
    fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wraps an existing identifier.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl std::fmt::Display for LineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// One product entry in a cart.
///
/// The unit price is resolved once when the line is first created and never
/// recomputed from the catalog; the line total is derived on every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    line_id: LineId,
    product: ProductSnapshot,
    quantity: u32,
    unit_price: Decimal,
    line_total: Decimal,
    created_at: Timestamp,
}

impl CartLineItem {
    fn new(product: ProductSnapshot, quantity: u32) -> Self {
        let product = product.normalized();
        let unit_price = unit_price(&product);

        Self {
            line_id: LineId::generate(),
            product,
            quantity,
            unit_price,
            line_total: unit_price * Decimal::from(quantity),
            created_at: Timestamp::now(),
        }
    }

    fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
        self.line_total = self.unit_price * Decimal::from(quantity);
    }

    /// Returns the line identifier.
    #[must_use]
    pub fn line_id(&self) -> LineId {
        self.line_id
    }

    /// Returns the product snapshot captured at add-time.
    #[must_use]
    pub fn product(&self) -> &ProductSnapshot {
        &self.product
    }

    /// Returns the catalog identifier of the product on this line.
    #[must_use]
    pub fn product_id(&self) -> ProductId {
        self.product.id
    }

    /// Returns the quantity on this line.
    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Returns the unit price resolved at add-time.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    /// Returns the derived line total.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.line_total
    }

    /// Returns the timestamp of the line's first insertion.
    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

/// Cart
///
/// An ordered sequence of lines, unique by product, with a derived total
/// that is recomputed from the full line set after every mutation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    items: Vec<CartLineItem>,
    total_amount: Decimal,
}

impl Cart {
    /// Creates an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a product to the cart.
    ///
    /// A line already holding the same product absorbs the quantity,
    /// saturating at [`u32::MAX`]; a new product appends a fresh line with a
    /// newly generated [`LineId`]. The returned identifier names the
    /// affected line either way.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] when `quantity` is zero.
    pub fn add_or_increment(
        &mut self,
        product: ProductSnapshot,
        quantity: u32,
    ) -> Result<LineId, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let line_id = if let Some(line) = self.items.iter_mut().find(|l| l.product.id == product.id)
        {
            line.set_quantity(line.quantity.saturating_add(quantity));
            line.line_id
        } else {
            let line = CartLineItem::new(product, quantity);
            let line_id = line.line_id;
            self.items.push(line);
            line_id
        };

        self.recompute_total();

        Ok(line_id)
    }

    /// Removes a line from the cart.
    ///
    /// Removing an absent line is a no-op, so the operation is idempotent.
    pub fn remove_line(&mut self, line_id: LineId) {
        self.items.retain(|line| line.line_id != line_id);
        self.recompute_total();
    }

    /// Overwrites the quantity of an existing line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] when `quantity` is zero and
    /// [`CartError::UnknownLine`] when no such line exists.
    pub fn set_quantity(&mut self, line_id: LineId, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let line = self
            .items
            .iter_mut()
            .find(|line| line.line_id == line_id)
            .ok_or(CartError::UnknownLine)?;

        line.set_quantity(quantity);
        self.recompute_total();

        Ok(())
    }

    fn recompute_total(&mut self) {
        self.total_amount = self.items.iter().map(CartLineItem::line_total).sum();
    }

    /// Sum of quantities across all lines, for badge counters.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(CartLineItem::quantity).sum()
    }

    /// Returns the derived cart total.
    #[must_use]
    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    /// Gets a line by identifier.
    #[must_use]
    pub fn get_line(&self, line_id: LineId) -> Option<&CartLineItem> {
        self.items.iter().find(|line| line.line_id == line_id)
    }

    /// Iterates over the lines in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &CartLineItem> {
        self.items.iter()
    }

    /// Returns the number of lines in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Checks whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
