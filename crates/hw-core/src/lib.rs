//! hw-core: Core abstractions for hostwatch
//!
//! This crate defines the domain types shared across the workspace, the
//! error taxonomy, process configuration, and the transport trait seam
//! behind which the SSH implementation lives.

pub mod config;
pub mod error;
pub mod transport;
pub mod types;

pub use error::{ConfigError, TransportError, WatchError};
pub use transport::{SessionEvent, Transport, TransportSession};
pub use types::{Credentials, HostAddr, HostStatus, StatusSnapshot, SubscriberId};
