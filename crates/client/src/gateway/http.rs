//! HTTP cart gateway

use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::debug;
use trolley::{cart::Cart, products::ProductId};

use crate::session::SessionCredential;

use super::{CartGateway, GatewayError, RemoteLine};

/// Configuration for reaching the remote cart API.
#[derive(Debug, Clone)]
pub struct HttpGatewayConfig {
    /// API origin, e.g. `"https://shop.example.com"`.
    pub base_url: String,

    /// Credential issued at login, sent as a bearer token on every call.
    pub credential: SessionCredential,
}

/// [`CartGateway`] over the shop's REST API.
#[derive(Debug, Clone)]
pub struct HttpCartGateway {
    config: HttpGatewayConfig,
    http: Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddItemRequest {
    product_id: ProductId,
    quantity: u32,
}

impl HttpCartGateway {
    /// Creates a gateway from the given configuration.
    #[must_use]
    pub fn new(config: HttpGatewayConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();

        if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
            Err(GatewayError::Validation(format!("{status}: {body}")))
        } else {
            Err(GatewayError::Network(format!("{status}: {body}")))
        }
    }
}

#[async_trait::async_trait]
impl CartGateway for HttpCartGateway {
    async fn add_item(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<RemoteLine, GatewayError> {
        debug!(%product_id, quantity, "adding item to server cart");

        let response = self
            .http
            .post(self.url("/api/cart/items"))
            .bearer_auth(self.config.credential.token())
            .json(&AddItemRequest {
                product_id,
                quantity,
            })
            .send()
            .await?;

        let line = Self::check(response).await?.json::<RemoteLine>().await?;

        Ok(line)
    }

    async fn remove_all_items(&self) -> Result<(), GatewayError> {
        debug!("removing all items from server cart");

        let response = self
            .http
            .delete(self.url("/api/cart/items"))
            .bearer_auth(self.config.credential.token())
            .send()
            .await?;

        Self::check(response).await?;

        Ok(())
    }

    async fn fetch_cart(&self) -> Result<Cart, GatewayError> {
        let response = self
            .http
            .get(self.url("/api/cart"))
            .bearer_auth(self.config.credential.token())
            .send()
            .await?;

        let cart = Self::check(response).await?.json::<Cart>().await?;

        Ok(cart)
    }
}
