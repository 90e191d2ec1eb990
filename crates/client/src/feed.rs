//! Cart-updated broadcast

use tokio::sync::broadcast;
use tracing::trace;
use trolley::cart::Cart;

const FEED_CAPACITY: usize = 16;

/// Broadcast feed of cart snapshots.
///
/// Every mutation publishes exactly one snapshot, so independent widgets
/// (badge counters, mini-carts) stay consistent without polling shared
/// state. Publishing with no subscribers is not an error.
#[derive(Debug, Clone)]
pub struct CartFeed {
    sender: broadcast::Sender<Cart>,
}

impl Default for CartFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl CartFeed {
    /// Creates a feed with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(FEED_CAPACITY);

        Self { sender }
    }

    /// Subscribes to future cart snapshots.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Cart> {
        self.sender.subscribe()
    }

    /// Publishes a snapshot of the cart after a mutation.
    pub fn publish(&self, cart: Cart) {
        if self.sender.send(cart).is_err() {
            trace!("cart update published with no subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_snapshots() -> TestResult {
        let feed = CartFeed::new();
        let mut updates = feed.subscribe();

        feed.publish(Cart::new());

        let snapshot = updates.recv().await?;

        assert!(snapshot.is_empty(), "expected the published empty cart");

        Ok(())
    }

    #[test]
    fn publishing_without_subscribers_is_not_an_error() {
        let feed = CartFeed::new();

        feed.publish(Cart::new());
    }
}
