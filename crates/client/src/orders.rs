//! Order submission flow

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use trolley::orders::{OrderContact, OrderError, OrderRequest};

use crate::{
    gateway::{CartGateway, GatewayError},
    session::{CartSession, SessionError},
    store::LocalStore,
};

/// Errors raised by the order submission flow.
#[derive(Debug, Error)]
pub enum OrderFlowError {
    /// The order payload could not be built; no network call was made.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// The order API call failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The active cart could not be read or cleared.
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Server-issued order identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

/// Acknowledgment returned when an order is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAck {
    /// Identifier to poll the order status with.
    pub order_id: OrderId,
}

/// Externally observed order state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderStatus {
    /// Awaiting payment.
    Pending,

    /// Payment confirmed; the cart may now be cleared.
    Paid,

    /// The order was rejected; the cart stays as it was.
    Rejected,
}

/// Thin client over the remote order API.
#[automock]
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Submits an order built from the current cart.
    async fn submit_order(&self, request: OrderRequest) -> Result<OrderAck, GatewayError>;

    /// Fetches the current status of a previously submitted order.
    async fn fetch_status(&self, order_id: OrderId) -> Result<OrderStatus, GatewayError>;
}

/// Converts the active cart into an order and clears state once the order
/// is confirmed.
///
/// Submission alone never clears the cart: an order can still be rejected
/// downstream, so clearing waits for an observed paid status and then
/// happens exactly once.
#[derive(Debug)]
pub struct OrderFlow<S, G, O> {
    session: Arc<CartSession<S, G>>,
    orders: Arc<O>,
    currency: String,
    cleared: AtomicBool,
}

impl<S, G, O> OrderFlow<S, G, O>
where
    S: LocalStore,
    G: CartGateway + 'static,
    O: OrderGateway,
{
    /// Creates a flow submitting in the given ISO currency.
    #[must_use]
    pub fn new(session: Arc<CartSession<S, G>>, orders: Arc<O>, currency: impl Into<String>) -> Self {
        Self {
            session,
            orders,
            currency: currency.into(),
            cleared: AtomicBool::new(false),
        }
    }

    /// Submits the active cart as an order.
    ///
    /// The empty-cart check runs client-side before the order API is
    /// touched; a successful acknowledgment does not clear the cart.
    ///
    /// # Errors
    ///
    /// Returns [`OrderFlowError::Order`] for an empty cart (no network call
    /// issued) and [`OrderFlowError::Gateway`] when submission fails.
    pub async fn submit(&self, contact: OrderContact) -> Result<OrderAck, OrderFlowError> {
        let cart = self.session.current().await?;
        let request = OrderRequest::from_cart(&cart, contact, &self.currency)?;

        debug!(lines = request.items.len(), total = %request.total_amount, "submitting order");

        let ack = self.orders.submit_order(request).await?;

        info!(order_id = %ack.order_id.0, "order accepted");

        Ok(ack)
    }

    /// Fetches the status of a submitted order.
    ///
    /// # Errors
    ///
    /// Returns [`OrderFlowError::Gateway`] when the status cannot be read.
    pub async fn poll_status(&self, order_id: OrderId) -> Result<OrderStatus, OrderFlowError> {
        let status = self.orders.fetch_status(order_id).await?;

        Ok(status)
    }

    /// Reacts to an externally observed order status.
    ///
    /// The first observed paid status clears the server cart, deletes the
    /// local record and broadcasts one empty snapshot; repeat observations
    /// and non-paid statuses are no-ops.
    ///
    /// # Errors
    ///
    /// Returns [`OrderFlowError::Session`] when clearing fails; the flow
    /// stays armed so a later observation can retry.
    pub async fn observe_status(&self, status: OrderStatus) -> Result<(), OrderFlowError> {
        if status != OrderStatus::Paid {
            return Ok(());
        }

        if self.cleared.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        if let Err(error) = self.session.clear_all().await {
            self.cleared.store(false, Ordering::SeqCst);
            return Err(error.into());
        }

        info!("order paid, cart cleared");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;
    use trolley::products::{ProductId, ProductSnapshot};
    use uuid::Uuid;

    use crate::{
        feed::CartFeed,
        gateway::MockCartGateway,
        guest::GuestCartManager,
        session::SessionCredential,
        store::MemoryStore,
    };

    use super::*;

    fn widget(price: i64) -> ProductSnapshot {
        ProductSnapshot {
            id: ProductId::from_uuid(Uuid::now_v7()),
            name: "Widget".to_string(),
            sku: "W-100".to_string(),
            description: None,
            image_url: None,
            price: Decimal::from(price),
            discounted_price: None,
        }
    }

    fn contact() -> OrderContact {
        OrderContact {
            customer_name: "Jamie Doe".to_string(),
            customer_phone: "010-0000-0000".to_string(),
        }
    }

    fn anonymous_session(
        gateway: MockCartGateway,
    ) -> Arc<CartSession<MemoryStore, MockCartGateway>> {
        let guest = GuestCartManager::new(Arc::new(MemoryStore::new()), CartFeed::new());

        Arc::new(CartSession::new(guest, Arc::new(gateway)))
    }

    #[tokio::test]
    async fn empty_cart_is_rejected_without_any_network_call() {
        let session = anonymous_session(MockCartGateway::new());

        let mut orders = MockOrderGateway::new();
        orders.expect_submit_order().times(0);

        let flow = OrderFlow::new(session, Arc::new(orders), "USD");
        let result = flow.submit(contact()).await;

        assert!(
            matches!(result, Err(OrderFlowError::Order(OrderError::EmptyCart))),
            "expected EmptyCart, got {result:?}"
        );
    }

    #[tokio::test]
    async fn successful_submission_does_not_clear_the_cart() -> TestResult {
        let session = anonymous_session(MockCartGateway::new());
        session.guest().add_item(widget(10), 2)?;

        let mut orders = MockOrderGateway::new();
        orders.expect_submit_order().times(1).returning(|request| {
            assert_eq!(request.total_amount, Decimal::from(20));
            Ok(OrderAck {
                order_id: OrderId("ord-1".to_string()),
            })
        });

        let flow = OrderFlow::new(Arc::clone(&session), Arc::new(orders), "USD");
        let ack = flow.submit(contact()).await?;

        assert_eq!(ack.order_id, OrderId("ord-1".to_string()));
        assert_eq!(session.guest().load().item_count(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn paid_status_clears_everywhere_exactly_once() -> TestResult {
        let mut gateway = MockCartGateway::new();
        gateway.expect_remove_all_items().times(1).returning(|| Ok(()));

        let session = anonymous_session(gateway);
        session
            .authenticated(SessionCredential::new("token"))
            .await;

        let mut updates = session.guest().feed().subscribe();

        let flow = OrderFlow::new(
            Arc::clone(&session),
            Arc::new(MockOrderGateway::new()),
            "USD",
        );

        flow.observe_status(OrderStatus::Paid).await?;
        flow.observe_status(OrderStatus::Paid).await?;

        assert!(session.guest().load().is_empty(), "local record must be gone");

        let snapshot = updates.recv().await?;

        assert!(snapshot.is_empty(), "expected one empty snapshot");
        assert!(
            matches!(
                updates.try_recv(),
                Err(tokio::sync::broadcast::error::TryRecvError::Empty)
            ),
            "clearing must broadcast exactly once"
        );

        Ok(())
    }

    #[tokio::test]
    async fn non_paid_statuses_leave_the_cart_alone() -> TestResult {
        let session = anonymous_session(MockCartGateway::new());
        session.guest().add_item(widget(10), 1)?;

        let flow = OrderFlow::new(
            Arc::clone(&session),
            Arc::new(MockOrderGateway::new()),
            "USD",
        );

        flow.observe_status(OrderStatus::Pending).await?;
        flow.observe_status(OrderStatus::Rejected).await?;

        assert_eq!(session.guest().load().item_count(), 1);

        Ok(())
    }
}
