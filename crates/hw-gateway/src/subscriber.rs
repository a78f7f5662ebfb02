//! Per-subscriber connection handler
//!
//! One task per WebSocket connection. The task owns the subscriber's
//! registry, so configuration messages and supervisor status callbacks are
//! serialized on a single select loop and never race.

use std::net::SocketAddr;
use std::sync::Arc;

use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};
use tokio_util::sync::CancellationToken;

use hw_core::config::WatchSettings;
use hw_core::transport::Transport;
use hw_core::types::SubscriberId;
use hw_monitor::SubscriberRegistry;

use crate::proto::{ClientMessage, ServerMessage};

/// Capacity for the per-subscriber status update channel.
///
/// Sized for bursts when a large host set flips at once; supervisors block
/// briefly rather than drop updates if the subscriber loop falls behind.
const STATUS_CHANNEL_CAPACITY: usize = 64;

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;

/// Handle one subscriber connection from WebSocket accept to teardown
pub(crate) async fn handle_subscriber<T: Transport>(
    stream: TcpStream,
    peer_addr: SocketAddr,
    transport: Arc<T>,
    settings: WatchSettings,
    cancel: CancellationToken,
) {
    let ws = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(err) => {
            tracing::warn!(peer = %peer_addr, error = %err, "WebSocket handshake failed");
            return;
        }
    };

    let subscriber = SubscriberId::new();
    tracing::info!(subscriber = %subscriber, peer = %peer_addr, "subscriber connected");

    let (mut sink, mut inbound) = ws.split();
    let (status_tx, mut status_rx) = mpsc::channel(STATUS_CHANNEL_CAPACITY);
    let mut registry = SubscriberRegistry::new(subscriber, transport, settings, status_tx);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            frame = inbound.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        let outbound = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::Configure(payload)) => {
                                registry.apply_configuration(payload.into()).await;
                                ServerMessage::ServerStatus(registry.snapshot())
                            }
                            Err(err) => {
                                tracing::warn!(
                                    subscriber = %subscriber,
                                    error = %err,
                                    "rejecting malformed configuration"
                                );
                                ServerMessage::Error(format!("invalid configuration: {}", err))
                            }
                        };
                        if !push(&mut sink, subscriber, &outbound).await {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {
                        // Binary and ping/pong frames carry no protocol meaning
                    }
                    Some(Err(err)) => {
                        tracing::warn!(subscriber = %subscriber, error = %err, "WebSocket error");
                        break;
                    }
                }
            }

            Some(update) = status_rx.recv() => {
                if registry.record_status(update) {
                    let snapshot = ServerMessage::ServerStatus(registry.snapshot());
                    if !push(&mut sink, subscriber, &snapshot).await {
                        break;
                    }
                }
            }
        }
    }

    registry.teardown().await;
    tracing::info!(subscriber = %subscriber, "subscriber disconnected");
}

/// Send one message to the subscriber. Returns `false` once the connection
/// is gone.
async fn push(sink: &mut WsSink, subscriber: SubscriberId, message: &ServerMessage) -> bool {
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(err) => {
            tracing::error!(subscriber = %subscriber, error = %err, "failed to encode message");
            return true;
        }
    };

    match sink.send(Message::Text(json)).await {
        Ok(()) => true,
        Err(err) => {
            tracing::debug!(subscriber = %subscriber, error = %err, "push failed, subscriber gone");
            false
        }
    }
}
