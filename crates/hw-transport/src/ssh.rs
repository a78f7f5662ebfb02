//! SSH session transport
//!
//! Establishes password-authenticated SSH sessions to watched hosts. A
//! control channel is held open for the lifetime of the session so that a
//! remote close or EOF surfaces as a passive `SessionEvent`; liveness is
//! verified by executing a trivial command on a fresh channel.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use russh::client::{self, Config, Handle, Msg};
use russh::{Channel, ChannelId, ChannelMsg, Disconnect};
use russh_keys::key::PublicKey;
use tokio::sync::mpsc;

use hw_core::transport::{SessionEvent, Transport, TransportSession};
use hw_core::types::{Credentials, HostAddr};
use hw_core::TransportError;

/// Trivial command executed as the liveness probe
pub const PROBE_COMMAND: &str = "echo keep-alive";

/// Channel capacity for passive session events.
///
/// A session only ever produces a handful of events (a close and possibly a
/// trailing EOF), so a small buffer is enough.
const SESSION_EVENT_CHANNEL_CAPACITY: usize = 16;

/// Opens SSH sessions to watched hosts
pub struct SshTransport {
    /// SSH port on the watched hosts
    port: u16,
    /// Shared russh client configuration
    config: Arc<Config>,
}

impl SshTransport {
    /// Create a new SSH transport connecting on the given port
    pub fn new(port: u16) -> Self {
        Self {
            port,
            config: Arc::new(Config::default()),
        }
    }
}

#[async_trait]
impl Transport for SshTransport {
    type Session = SshSession;

    async fn open(
        &self,
        host: &HostAddr,
        credentials: &Credentials,
        timeout: Duration,
    ) -> Result<(SshSession, mpsc::Receiver<SessionEvent>), TransportError> {
        let (event_tx, event_rx) = mpsc::channel(SESSION_EVENT_CHANNEL_CAPACITY);
        let handler = ClientHandler { event_tx };

        tracing::debug!(host = %host, port = self.port, "connecting");
        let mut handle = tokio::time::timeout(
            timeout,
            client::connect(
                Arc::clone(&self.config),
                (host.as_str(), self.port),
                handler,
            ),
        )
        .await
        .map_err(|_| TransportError::Timeout(timeout))?
        .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;

        let authenticated = handle
            .authenticate_password(credentials.login.as_str(), credentials.secret.as_str())
            .await
            .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;

        if !authenticated {
            return Err(TransportError::AuthFailed(host.to_string()));
        }

        // Held for the session's lifetime; its close/EOF is the passive
        // failure signal.
        let control = handle
            .channel_open_session()
            .await
            .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;

        tracing::debug!(host = %host, "session established");
        Ok((SshSession { handle, control }, event_rx))
    }
}

/// An open SSH session to one host
pub struct SshSession {
    /// SSH client handle
    handle: Handle<ClientHandler>,
    /// Control channel kept open to detect remote close
    #[allow(dead_code)]
    control: Channel<Msg>,
}

#[async_trait]
impl TransportSession for SshSession {
    async fn probe(&mut self) -> Result<(), TransportError> {
        let mut channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| TransportError::ProbeFailed(e.to_string()))?;

        channel
            .exec(true, PROBE_COMMAND)
            .await
            .map_err(|e| TransportError::ProbeFailed(e.to_string()))?;

        loop {
            match channel.wait().await {
                Some(ChannelMsg::ExitStatus { exit_status }) => {
                    return if exit_status == 0 {
                        Ok(())
                    } else {
                        Err(TransportError::ProbeFailed(format!(
                            "probe exited with status {}",
                            exit_status
                        )))
                    };
                }
                Some(_) => continue,
                None => {
                    return Err(TransportError::ConnectionLost(
                        "channel closed before probe completed".to_string(),
                    ));
                }
            }
        }
    }

    async fn close(&mut self) {
        let _ = self
            .handle
            .disconnect(Disconnect::ByApplication, "watch ended", "en")
            .await;
    }
}

/// russh client handler forwarding passive session signals
struct ClientHandler {
    /// Event sender wired into the owning supervisor
    event_tx: mpsc::Sender<SessionEvent>,
}

#[async_trait]
impl client::Handler for ClientHandler {
    type Error = russh::Error;

    /// Accept the server's host key.
    ///
    /// Subscribers supply per-host passwords and no pinned fingerprints, so
    /// trust rests on the credential exchange rather than key pinning.
    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        tracing::trace!("server host key: {}", server_public_key.fingerprint());
        Ok(true)
    }

    /// Handle channel close.
    ///
    /// Remote servers fire EOF and close in close succession for a single
    /// teardown; both are forwarded and the supervisor collapses them.
    async fn channel_close(
        &mut self,
        _channel: ChannelId,
        _session: &mut client::Session,
    ) -> Result<(), Self::Error> {
        let _ = self.event_tx.send(SessionEvent::Closed).await;
        Ok(())
    }

    /// Handle channel EOF
    async fn channel_eof(
        &mut self,
        _channel: ChannelId,
        _session: &mut client::Session,
    ) -> Result<(), Self::Error> {
        let _ = self.event_tx.send(SessionEvent::Closed).await;
        Ok(())
    }
}
