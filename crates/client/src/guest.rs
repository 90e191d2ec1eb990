//! Guest cart manager

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};
use trolley::{
    cart::{Cart, CartError, LineId},
    products::ProductSnapshot,
};

use crate::{
    feed::CartFeed,
    store::{LocalStore, StoreError},
};

/// Well-known key the serialized guest cart lives under.
pub const CART_KEY: &str = "cart";

/// Errors raised by guest cart mutations.
///
/// Validation failures surface before any store write; loading never fails
/// (unreadable state degrades to an empty cart).
#[derive(Debug, Error)]
pub enum GuestCartError {
    /// The mutation was rejected by the aggregate.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// The mutated cart could not be persisted.
    #[error("failed to persist guest cart")]
    Store(#[from] StoreError),

    /// The cart could not be serialized for storage.
    #[error("failed to encode guest cart")]
    Encode(#[from] serde_json::Error),
}

/// Durability for the cart aggregate during unauthenticated sessions.
///
/// Every mutation entry point is load, mutate, save, publish; the whole
/// sequence is synchronous so read-modify-write races cannot occur between
/// mutations issued by one process.
#[derive(Debug)]
pub struct GuestCartManager<S> {
    store: Arc<S>,
    feed: CartFeed,
}

impl<S> Clone for GuestCartManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            feed: self.feed.clone(),
        }
    }
}

impl<S: LocalStore> GuestCartManager<S> {
    /// Creates a manager over the given store, publishing to `feed`.
    #[must_use]
    pub fn new(store: Arc<S>, feed: CartFeed) -> Self {
        Self { store, feed }
    }

    /// Returns the feed mutations are published to.
    #[must_use]
    pub fn feed(&self) -> &CartFeed {
        &self.feed
    }

    /// Loads the guest cart.
    ///
    /// Missing, corrupt or unparsable stored state yields an empty cart;
    /// persistence problems are logged and never block shopping.
    #[must_use]
    pub fn load(&self) -> Cart {
        let raw = match self.store.get(CART_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Cart::new(),
            Err(error) => {
                warn!(%error, "guest cart unreadable, starting empty");
                return Cart::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(cart) => cart,
            Err(error) => {
                warn!(%error, "guest cart record corrupt, starting empty");
                Cart::new()
            }
        }
    }

    /// Persists the full cart as a single record, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns a [`GuestCartError`] when the record cannot be encoded or
    /// written.
    pub fn save(&self, cart: &Cart) -> Result<(), GuestCartError> {
        let raw = serde_json::to_string(cart)?;
        self.store.put(CART_KEY, &raw)?;

        Ok(())
    }

    /// Deletes the stored record entirely, so the next [`load`](Self::load)
    /// yields a fresh empty cart rather than a stale empty record.
    ///
    /// # Errors
    ///
    /// Returns a [`GuestCartError`] when the record cannot be deleted.
    pub fn clear(&self) -> Result<(), GuestCartError> {
        self.store.delete(CART_KEY)?;

        Ok(())
    }

    /// Adds a product to the guest cart.
    ///
    /// # Errors
    ///
    /// Returns a [`GuestCartError`] on invalid quantity (before any store
    /// write) or on a failed save.
    pub fn add_item(
        &self,
        product: ProductSnapshot,
        quantity: u32,
    ) -> Result<Cart, GuestCartError> {
        self.mutate(|cart| cart.add_or_increment(product, quantity).map(|_| ()))
    }

    /// Removes a line from the guest cart; absent lines are a no-op.
    ///
    /// # Errors
    ///
    /// Returns a [`GuestCartError`] on a failed save.
    pub fn remove_line(&self, line_id: LineId) -> Result<Cart, GuestCartError> {
        self.mutate(|cart| {
            cart.remove_line(line_id);
            Ok(())
        })
    }

    /// Overwrites the quantity of an existing line.
    ///
    /// # Errors
    ///
    /// Returns a [`GuestCartError`] on invalid quantity, unknown line, or a
    /// failed save.
    pub fn set_quantity(&self, line_id: LineId, quantity: u32) -> Result<Cart, GuestCartError> {
        self.mutate(|cart| cart.set_quantity(line_id, quantity))
    }

    fn mutate(
        &self,
        apply: impl FnOnce(&mut Cart) -> Result<(), CartError>,
    ) -> Result<Cart, GuestCartError> {
        let mut cart = self.load();

        apply(&mut cart)?;
        self.save(&cart)?;

        debug!(lines = cart.len(), total = %cart.total_amount(), "guest cart updated");
        self.feed.publish(cart.clone());

        Ok(cart)
    }
}
