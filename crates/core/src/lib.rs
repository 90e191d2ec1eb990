//! Trolley
//!
//! Trolley is the pure domain half of a client-side shopping cart: product
//! snapshots, price resolution, the cart aggregate and order payload
//! construction. It performs no I/O; durability, networking and the
//! guest-to-server migration live in `trolley-client`.

pub mod cart;
pub mod orders;
pub mod pricing;
pub mod products;
