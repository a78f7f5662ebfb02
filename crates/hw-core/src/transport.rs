//! Transport trait seam
//!
//! The remote-shell capability is opaque to the rest of the system: open a
//! session given host and credentials, execute a trivial command on it, and
//! surface passive error/close notifications. Supervisors depend only on
//! these traits; the russh implementation lives in `hw-transport`.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::error::TransportError;
use crate::types::{Credentials, HostAddr};

/// Passive notification from an open session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session hit a transport-level error
    Error(String),
    /// The session was closed by the remote side
    Closed,
}

/// Factory for remote-shell sessions
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// The session type produced by this transport
    type Session: TransportSession;

    /// Open a session to `host` with the given credentials.
    ///
    /// Completes once with a session and its event receiver, or reports an
    /// error once. Both `Error` and `Closed` may be delivered for a single
    /// underlying failure; consumers must tolerate the double-fire.
    async fn open(
        &self,
        host: &HostAddr,
        credentials: &Credentials,
        timeout: Duration,
    ) -> Result<(Self::Session, mpsc::Receiver<SessionEvent>), TransportError>;
}

/// An open remote-shell session
#[async_trait]
pub trait TransportSession: Send + 'static {
    /// Execute a trivial command to verify the session is alive
    async fn probe(&mut self) -> Result<(), TransportError>;

    /// Force-close the session. Idempotent.
    async fn close(&mut self);
}
