//! Order payloads

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::{Cart, CartLineItem};

/// Errors raised while building an order request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    /// The active cart has no lines; checked before any network call.
    #[error("cart is empty")]
    EmptyCart,
}

/// Buyer contact details attached to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderContact {
    /// Buyer name.
    pub customer_name: String,

    /// Buyer phone number.
    pub customer_phone: String,
}

/// Order submission payload built from the current cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    /// Buyer name.
    pub customer_name: String,

    /// Buyer phone number.
    pub customer_phone: String,

    /// Lines of the cart at submission time.
    pub items: Vec<CartLineItem>,

    /// Derived cart total at submission time.
    pub total_amount: Decimal,

    /// Three-letter ISO currency code.
    pub currency: String,
}

impl OrderRequest {
    /// Builds an order request from the current cart and contact details.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::EmptyCart`] when the cart has no lines, so the
    /// caller can reject the submission without a wasted round trip.
    pub fn from_cart(
        cart: &Cart,
        contact: OrderContact,
        currency: &str,
    ) -> Result<Self, OrderError> {
        if cart.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        Ok(Self {
            customer_name: contact.customer_name,
            customer_phone: contact.customer_phone,
            items: cart.iter().cloned().collect(),
            total_amount: cart.total_amount(),
            currency: currency.to_string(),
        })
    }
}
