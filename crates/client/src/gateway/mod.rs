//! Server cart gateway

use async_trait::async_trait;
use mockall::automock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use trolley::{cart::Cart, products::ProductId};

mod http;

pub use http::{HttpCartGateway, HttpGatewayConfig};

/// Errors raised by remote cart calls.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// Transport failure; the operation may be retried.
    #[error("network error: {0}")]
    Network(String),

    /// The server rejected the request payload.
    #[error("validation failed: {0}")]
    Validation(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

/// Line state returned by the server after an add.
///
/// The server resolves price and identity from its own catalog; nothing
/// client-captured is echoed back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteLine {
    /// Catalog identifier of the added product.
    pub product_id: ProductId,

    /// Quantity now on the server-side line.
    pub quantity: u32,

    /// Unit price the server resolved at add-time.
    pub unit_price: Decimal,
}

/// Thin client over the remote cart API for the authenticated account.
///
/// The session credential travels with the implementation, not with these
/// calls. Failed calls leave no partial local state behind.
#[automock]
#[async_trait]
pub trait CartGateway: Send + Sync {
    /// Adds `quantity` of a product to the server cart.
    async fn add_item(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<RemoteLine, GatewayError>;

    /// Removes every line from the server cart.
    async fn remove_all_items(&self) -> Result<(), GatewayError>;

    /// Fetches the current server cart.
    async fn fetch_cart(&self) -> Result<Cart, GatewayError>;
}
