//! Guest-to-server cart migration
//!
//! Moves a guest cart into the server cart when a session becomes
//! authenticated, at most once per guest-cart generation. The trigger is
//! "login just succeeded", which can fire more than once (duplicate events,
//! concurrent logins), so the coordinator claims the generation through an
//! explicit state machine before touching anything.

use std::sync::Arc;

use tokio::{sync::Mutex, task::JoinSet};
use tracing::{debug, info, warn};
use trolley::cart::Cart;

use crate::{gateway::CartGateway, guest::GuestCartManager, store::LocalStore};

/// Migration state for one guest-cart generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No migration attempted yet.
    Idle,

    /// A caller has claimed the generation and is about to read it.
    Claimed,

    /// Replay calls are in flight.
    Migrating,

    /// The generation was consumed; terminal.
    Done,

    /// The last attempt failed; the next login may claim again.
    Failed,
}

/// What a [`SyncCoordinator::run`] call accomplished.
///
/// This is a value rather than an error so that sync can never block the
/// surrounding login flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Another caller already claimed or consumed this generation.
    AlreadyHandled,

    /// The guest cart had no lines; nothing to migrate.
    NothingToSync,

    /// Every line was replayed and the guest cart was cleared.
    Migrated {
        /// Number of lines replayed.
        lines: usize,
    },

    /// One or more replay calls failed, or the replayed cart could not be
    /// consumed locally; the guest cart was left in place.
    Failed {
        /// Number of failed replay calls.
        failed: usize,

        /// Number of lines attempted.
        total: usize,
    },
}

/// Single-shot migration of a guest cart into the server cart.
///
/// Replay carries only `(product_id, quantity)`: the server resolves price
/// and identity from its own catalog at add-time, so the locally captured
/// snapshot price is discarded at the authentication boundary.
#[derive(Debug)]
pub struct SyncCoordinator<S, G> {
    guest: GuestCartManager<S>,
    gateway: Arc<G>,
    state: Mutex<SyncState>,
}

impl<S, G> SyncCoordinator<S, G>
where
    S: LocalStore,
    G: CartGateway + 'static,
{
    /// Creates a coordinator for the current guest-cart generation.
    #[must_use]
    pub fn new(guest: GuestCartManager<S>, gateway: Arc<G>) -> Self {
        Self {
            guest,
            gateway,
            state: Mutex::new(SyncState::Idle),
        }
    }

    /// Returns the current migration state.
    pub async fn state(&self) -> SyncState {
        *self.state.lock().await
    }

    /// Migrates the guest cart into the server cart.
    ///
    /// The generation is claimed before the guest cart is read, so a
    /// concurrent caller observes the claim and skips instead of replaying
    /// the same lines twice. All per-line adds run concurrently; the guest
    /// cart is cleared only after every call has settled successfully. On
    /// any failure the guest cart is preserved for a later retry.
    ///
    /// A clear that cannot delete the record falls back to overwriting it
    /// with an empty cart; when neither write lands the run reports failure,
    /// keeping the generation claimable instead of leaving replayed lines
    /// behind as if consumed.
    pub async fn run(&self) -> SyncOutcome {
        {
            let mut state = self.state.lock().await;

            match *state {
                SyncState::Idle | SyncState::Failed => *state = SyncState::Claimed,
                SyncState::Claimed | SyncState::Migrating | SyncState::Done => {
                    debug!(state = ?*state, "guest cart already claimed, skipping sync");
                    return SyncOutcome::AlreadyHandled;
                }
            }
        }

        let cart = self.guest.load();

        if cart.is_empty() {
            *self.state.lock().await = SyncState::Done;
            return SyncOutcome::NothingToSync;
        }

        *self.state.lock().await = SyncState::Migrating;

        let total = cart.len();
        let mut replays = JoinSet::new();

        for line in cart.iter() {
            let gateway = Arc::clone(&self.gateway);
            let product_id = line.product_id();
            let quantity = line.quantity();

            replays.spawn(async move { gateway.add_item(product_id, quantity).await });
        }

        let mut failed = 0;

        while let Some(joined) = replays.join_next().await {
            match joined {
                Ok(Ok(_)) => {}
                Ok(Err(error)) => {
                    warn!(%error, "guest line replay failed");
                    failed += 1;
                }
                Err(error) => {
                    warn!(%error, "guest line replay task aborted");
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            *self.state.lock().await = SyncState::Failed;
            warn!(failed, total, "cart sync incomplete, guest cart preserved");
            return SyncOutcome::Failed { failed, total };
        }

        // Consumption must be durable: a record that survives the replay
        // would be replayed again by the next generation. Fall back to
        // overwriting with an empty record when the delete fails.
        if let Err(error) = self.guest.clear() {
            warn!(%error, "replayed guest cart could not be deleted, overwriting instead");

            if let Err(error) = self.guest.save(&Cart::new()) {
                warn!(%error, "replayed guest cart could not be consumed locally");
                *self.state.lock().await = SyncState::Failed;
                return SyncOutcome::Failed { failed: 0, total };
            }
        }

        self.guest.feed().publish(Cart::new());
        *self.state.lock().await = SyncState::Done;
        info!(lines = total, "guest cart migrated to server cart");

        SyncOutcome::Migrated { lines: total }
    }
}
