//! Trolley client
//!
//! The effectful half of the trolley cart engine: durable local storage for
//! guest carts, the server cart gateway, the one-shot guest-to-server
//! migration at login, order submission, and the cart-updated broadcast
//! that keeps independent widgets consistent.
//!
//! The pure aggregate and payload types live in the [`trolley`] crate.

pub mod feed;
pub mod gateway;
pub mod guest;
pub mod orders;
pub mod session;
pub mod store;
pub mod sync;
