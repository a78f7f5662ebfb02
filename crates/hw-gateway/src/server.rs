//! WebSocket listener
//!
//! Accepts subscriber connections and spawns a handler task for each.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use hw_core::config::WatchSettings;
use hw_core::transport::Transport;

use crate::subscriber::handle_subscriber;

/// The status broadcast gateway
pub struct Gateway<T: Transport> {
    /// Transport handed to every subscriber's supervisors
    transport: Arc<T>,
    /// Watch settings applied to every supervised session
    settings: WatchSettings,
}

impl<T: Transport> Gateway<T> {
    /// Create a new gateway
    pub fn new(transport: Arc<T>, settings: WatchSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    /// Bind `bind_addr` and serve until cancelled
    pub async fn run(&self, bind_addr: &str, cancel: CancellationToken) -> Result<()> {
        let listener = TcpListener::bind(bind_addr)
            .await
            .with_context(|| format!("Failed to bind to {}", bind_addr))?;
        self.serve(listener, cancel).await
    }

    /// Serve subscriber connections from an already-bound listener
    pub async fn serve(&self, listener: TcpListener, cancel: CancellationToken) -> Result<()> {
        let local_addr = listener.local_addr()?;
        tracing::info!("gateway listening on {}", local_addr);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("gateway shutting down");
                    break;
                }

                result = listener.accept() => {
                    match result {
                        Ok((socket, peer_addr)) => {
                            let transport = Arc::clone(&self.transport);
                            let settings = self.settings.clone();
                            let cancel = cancel.clone();

                            tokio::spawn(async move {
                                handle_subscriber(socket, peer_addr, transport, settings, cancel)
                                    .await;
                            });
                        }
                        Err(e) => {
                            tracing::error!("Failed to accept connection: {}", e);
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
