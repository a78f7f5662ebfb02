//! hw-gateway: WebSocket status broadcast gateway
//!
//! Accepts subscriber connections, owns one `SubscriberRegistry` per
//! connection, and pushes the subscriber's full status snapshot whenever it
//! changes. Subscribers drive the watched host set with `configure`
//! messages; disconnecting tears down every supervisor beneath them.

pub mod proto;
pub mod server;
mod subscriber;

pub use server::Gateway;
