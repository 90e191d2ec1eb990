//! Active-cart session
//!
//! Exactly one of the guest cart and the server cart is active at a time,
//! decided by the presence of a session credential. The session routes
//! mutations accordingly and owns the login transition that hands the guest
//! cart over to the server.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};
use trolley::{
    cart::{Cart, LineId},
    products::ProductSnapshot,
};

use crate::{
    gateway::{CartGateway, GatewayError},
    guest::{GuestCartError, GuestCartManager},
    store::LocalStore,
    sync::{SyncCoordinator, SyncOutcome},
};

/// Errors raised while operating on the active cart.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A remote cart call failed; local state is unchanged.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A guest cart operation failed.
    #[error(transparent)]
    Guest(#[from] GuestCartError),

    /// The remote cart API has no per-line edits; once authenticated the
    /// server is the sole writer of line state.
    #[error("operation not supported for the server cart")]
    ServerCartUnsupported,
}

/// Opaque session credential issued by the authentication service.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredential(String);

impl SessionCredential {
    /// Wraps a credential issued at login.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Exposes the raw token for transport.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionCredential(..)")
    }
}

/// Routes cart operations to the guest manager or the server gateway.
#[derive(Debug)]
pub struct CartSession<S, G> {
    guest: GuestCartManager<S>,
    gateway: Arc<G>,
    credential: RwLock<Option<SessionCredential>>,
    sync: Mutex<SyncCoordinator<S, G>>,
}

impl<S, G> CartSession<S, G>
where
    S: LocalStore,
    G: CartGateway + 'static,
{
    /// Creates an anonymous session over the given guest manager and
    /// gateway.
    #[must_use]
    pub fn new(guest: GuestCartManager<S>, gateway: Arc<G>) -> Self {
        let sync = SyncCoordinator::new(guest.clone(), Arc::clone(&gateway));

        Self {
            guest,
            gateway,
            credential: RwLock::new(None),
            sync: Mutex::new(sync),
        }
    }

    /// Returns the guest cart manager for direct local operations.
    #[must_use]
    pub fn guest(&self) -> &GuestCartManager<S> {
        &self.guest
    }

    /// Whether a session credential is currently held.
    pub async fn is_authenticated(&self) -> bool {
        self.credential.read().await.is_some()
    }

    /// Records a successful authentication and migrates the guest cart.
    ///
    /// A failed migration is logged and reported in the outcome, never
    /// raised: sync must not block a successful login. The guest cart stays
    /// in place for a retry on the next login in that case.
    pub async fn authenticated(&self, credential: SessionCredential) -> SyncOutcome {
        *self.credential.write().await = Some(credential);

        let outcome = self.sync.lock().await.run().await;

        if let SyncOutcome::Failed { failed, total } = outcome {
            warn!(failed, total, "cart sync failed after login, continuing");
        }

        outcome
    }

    /// Drops the session credential; a fresh guest-cart generation begins.
    pub async fn logged_out(&self) {
        *self.credential.write().await = None;
        *self.sync.lock().await =
            SyncCoordinator::new(self.guest.clone(), Arc::clone(&self.gateway));

        debug!("session ended, guest cart active");
    }

    /// Reads the active cart: the server cart when authenticated, the
    /// stored guest cart otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Gateway`] when the server cart cannot be
    /// fetched.
    pub async fn current(&self) -> Result<Cart, SessionError> {
        if self.is_authenticated().await {
            let cart = self.gateway.fetch_cart().await?;

            return Ok(cart);
        }

        Ok(self.guest.load())
    }

    /// Adds a product to the active cart and publishes the updated state.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] when the mutation is rejected or cannot
    /// be applied; local state is unchanged on a failed server call.
    pub async fn add_item(
        &self,
        product: ProductSnapshot,
        quantity: u32,
    ) -> Result<Cart, SessionError> {
        if self.is_authenticated().await {
            self.gateway.add_item(product.id, quantity).await?;

            let cart = self.gateway.fetch_cart().await?;
            self.guest.feed().publish(cart.clone());

            return Ok(cart);
        }

        let cart = self.guest.add_item(product, quantity)?;

        Ok(cart)
    }

    /// Removes a line from the active cart and publishes the updated state.
    ///
    /// The remote cart API exposes no per-line removal, so this operation
    /// exists only while anonymous; an authenticated session reports
    /// [`SessionError::ServerCartUnsupported`] and changes nothing.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] when a credential is held or the guest
    /// cart cannot be persisted.
    pub async fn remove_line(&self, line_id: LineId) -> Result<Cart, SessionError> {
        if self.is_authenticated().await {
            return Err(SessionError::ServerCartUnsupported);
        }

        let cart = self.guest.remove_line(line_id)?;

        Ok(cart)
    }

    /// Overwrites the quantity of a line in the active cart.
    ///
    /// Guest-only, for the same reason as [`remove_line`](Self::remove_line).
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] when a credential is held, the quantity is
    /// invalid, or the line does not exist.
    pub async fn set_quantity(&self, line_id: LineId, quantity: u32) -> Result<Cart, SessionError> {
        if self.is_authenticated().await {
            return Err(SessionError::ServerCartUnsupported);
        }

        let cart = self.guest.set_quantity(line_id, quantity)?;

        Ok(cart)
    }

    /// Clears the active cart everywhere and broadcasts one empty snapshot.
    ///
    /// The server cart is cleared only when a credential is held; the local
    /// record is always deleted.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] when either clear fails; nothing is
    /// broadcast in that case.
    pub async fn clear_all(&self) -> Result<(), SessionError> {
        if self.is_authenticated().await {
            self.gateway.remove_all_items().await?;
        }

        self.guest.clear()?;
        self.guest.feed().publish(Cart::new());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;
    use trolley::products::ProductId;
    use uuid::Uuid;

    use crate::{
        feed::CartFeed,
        gateway::{MockCartGateway, RemoteLine},
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

    fn session(gateway: MockCartGateway) -> CartSession<MemoryStore, MockCartGateway> {
        let guest = GuestCartManager::new(Arc::new(MemoryStore::new()), CartFeed::new());

        CartSession::new(guest, Arc::new(gateway))
    }

    #[tokio::test]
    async fn anonymous_mutations_stay_local() -> TestResult {
        let session = session(MockCartGateway::new());

        let cart = session.add_item(widget(10), 2).await?;

        assert_eq!(cart.item_count(), 2);
        assert_eq!(session.guest().load().item_count(), 2);
        assert!(!session.is_authenticated().await);

        Ok(())
    }

    #[tokio::test]
    async fn anonymous_line_edits_route_to_the_guest_cart() -> TestResult {
        let session = session(MockCartGateway::new());

        let cart = session.add_item(widget(10), 2).await?;
        session.add_item(widget(5), 1).await?;

        let line_id = cart.iter().next().map(|l| l.line_id()).ok_or("no line")?;

        let after_set = session.set_quantity(line_id, 4).await?;

        assert_eq!(after_set.item_count(), 5);

        let after_remove = session.remove_line(line_id).await?;

        assert_eq!(after_remove.len(), 1);
        assert_eq!(session.guest().load().item_count(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn authenticated_line_edits_are_rejected_without_local_changes() -> TestResult {
        let mut gateway = MockCartGateway::new();
        gateway.expect_add_item().times(1).returning(|id, quantity| {
            Ok(RemoteLine {
                product_id: id,
                quantity,
                unit_price: Decimal::from(10),
            })
        });

        let session = session(gateway);

        let cart = session.add_item(widget(10), 2).await?;
        let line_id = cart.iter().next().map(|l| l.line_id()).ok_or("no line")?;

        session.authenticated(SessionCredential::new("token")).await;

        let removed = session.remove_line(line_id).await;
        let resized = session.set_quantity(line_id, 1).await;

        assert!(
            matches!(removed, Err(SessionError::ServerCartUnsupported)),
            "expected ServerCartUnsupported, got {removed:?}"
        );
        assert!(
            matches!(resized, Err(SessionError::ServerCartUnsupported)),
            "expected ServerCartUnsupported, got {resized:?}"
        );
        assert!(
            session.guest().load().is_empty(),
            "rejected edits must not resurrect the consumed guest cart"
        );

        Ok(())
    }

    #[tokio::test]
    async fn authenticated_mutations_go_to_the_server() -> TestResult {
        let product = widget(10);
        let product_id = product.id;

        let mut gateway = MockCartGateway::new();
        gateway
            .expect_add_item()
            .withf(move |id, quantity| *id == product_id && *quantity == 2)
            .times(1)
            .returning(|id, quantity| {
                Ok(RemoteLine {
                    product_id: id,
                    quantity,
                    unit_price: Decimal::from(10),
                })
            });
        gateway
            .expect_fetch_cart()
            .times(1)
            .returning(|| Ok(Cart::new()));

        let session = session(gateway);
        session.authenticated(SessionCredential::new("token")).await;

        session.add_item(product, 2).await?;

        assert!(
            session.guest().load().is_empty(),
            "server-cart adds must not touch the local store"
        );

        Ok(())
    }

    #[tokio::test]
    async fn login_with_guest_lines_replays_and_clears() -> TestResult {
        let product = widget(10);
        let product_id = product.id;

        let mut gateway = MockCartGateway::new();
        gateway
            .expect_add_item()
            .withf(move |id, quantity| *id == product_id && *quantity == 3)
            .times(1)
            .returning(|id, quantity| {
                Ok(RemoteLine {
                    product_id: id,
                    quantity,
                    unit_price: Decimal::from(10),
                })
            });

        let session = session(gateway);
        session.guest().add_item(product, 3)?;

        let outcome = session.authenticated(SessionCredential::new("token")).await;

        assert_eq!(outcome, SyncOutcome::Migrated { lines: 1 });
        assert!(session.guest().load().is_empty(), "guest cart must be consumed");

        Ok(())
    }

    #[tokio::test]
    async fn logout_starts_a_fresh_generation() -> TestResult {
        let mut gateway = MockCartGateway::new();
        gateway.expect_add_item().times(1).returning(|id, quantity| {
            Ok(RemoteLine {
                product_id: id,
                quantity,
                unit_price: Decimal::from(10),
            })
        });

        let session = session(gateway);

        // First generation is empty and consumed at login.
        assert_eq!(
            session.authenticated(SessionCredential::new("one")).await,
            SyncOutcome::NothingToSync
        );

        session.logged_out().await;
        session.guest().add_item(widget(10), 1)?;

        assert_eq!(
            session.authenticated(SessionCredential::new("two")).await,
            SyncOutcome::Migrated { lines: 1 }
        );

        Ok(())
    }
}
