//! Realtime chat channel.
//!
//! One persistent connection per logged-in session. Inbound frames are
//! dispatched into the store in arrival order; outbound frames are
//! fire-and-forget — the optimistic local append already happened at
//! dispatch time, and a frame composed while the channel is down is dropped
//! with a debug log rather than queued. There is no delivery
//! acknowledgment; this at-most-once semantic is deliberate.

pub mod websocket;

pub use websocket::WebSocketTransport;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::app::domain::{Action, ChatMessage};
use crate::app::store::{ChatCommand, Store};

/// Reconnect backoff: 500ms base, doubling to a 30s cap, reset after a
/// successful connect.
const BACKOFF_BASE: Duration = Duration::from_millis(500);
const BACKOFF_CAP: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("codec error: {0}")]
    Codec(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Outbound wire frame: the composed text plus the sender's token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundChatFrame {
    pub message: String,
    pub token: String,
}

/// Inbound wire frame: text plus the author's identity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InboundChatFrame {
    pub message: String,
    pub username: String,
    pub avatar: String,
}

/// Connection factory. The WebSocket implementation is the production
/// transport; tests substitute scripted stubs.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn ChatConnection>, ChatError>;
}

/// One established connection.
#[async_trait]
pub trait ChatConnection: Send {
    async fn send(&mut self, frame: OutboundChatFrame) -> Result<(), ChatError>;
    /// Next inbound frame; `None` once the server closes the connection.
    async fn next(&mut self) -> Option<Result<InboundChatFrame, ChatError>>;
}

struct SessionHandle {
    token: CancellationToken,
    outbound_tx: mpsc::UnboundedSender<String>,
    handle: JoinHandle<()>,
}

/// Spawn the chat driver. It owns the channel lifecycle: `Connect` commands
/// establish at most one connection task per session, `Disconnect` and the
/// shutdown token tear it down, `Send` forwards composed text.
pub fn spawn_driver(
    store: Store,
    transport: Arc<dyn ChatTransport>,
    commands: mpsc::UnboundedReceiver<ChatCommand>,
    shutdown: CancellationToken,
) -> (JoinHandle<()>, watch::Receiver<ConnectionState>) {
    let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
    let handle = tokio::spawn(run_driver(store, transport, commands, shutdown, state_tx));
    (handle, state_rx)
}

async fn run_driver(
    store: Store,
    transport: Arc<dyn ChatTransport>,
    mut commands: mpsc::UnboundedReceiver<ChatCommand>,
    shutdown: CancellationToken,
    state_tx: watch::Sender<ConnectionState>,
) {
    let mut session: Option<SessionHandle> = None;

    loop {
        let command = tokio::select! {
            () = shutdown.cancelled() => break,
            command = commands.recv() => match command {
                Some(command) => command,
                None => break,
            },
        };

        match command {
            ChatCommand::Connect => {
                // A second connection would double-deliver every inbound
                // event; ignore connects while one session task is alive.
                if session.as_ref().is_some_and(|s| !s.handle.is_finished()) {
                    tracing::debug!("chat channel already up; ignoring duplicate connect");
                    continue;
                }
                let Some(user) = store.state().user else {
                    tracing::warn!("chat connect requested while logged out");
                    continue;
                };
                let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
                let token = shutdown.child_token();
                let handle = tokio::spawn(connection_task(
                    store.clone(),
                    Arc::clone(&transport),
                    user.token,
                    outbound_rx,
                    token.clone(),
                    state_tx.clone(),
                ));
                session = Some(SessionHandle {
                    token,
                    outbound_tx,
                    handle,
                });
            }
            ChatCommand::Disconnect => {
                if let Some(session) = session.take() {
                    session.token.cancel();
                }
                state_tx.send_replace(ConnectionState::Disconnected);
            }
            ChatCommand::Send { text } => {
                let delivered = session
                    .as_ref()
                    .is_some_and(|s| s.outbound_tx.send(text).is_ok());
                if !delivered {
                    // The optimistic local append stays; the frame is gone.
                    tracing::debug!("chat channel down; dropping outbound message");
                }
            }
        }
    }

    if let Some(session) = session.take() {
        session.token.cancel();
    }
    state_tx.send_replace(ConnectionState::Disconnected);
}

async fn connection_task(
    store: Store,
    transport: Arc<dyn ChatTransport>,
    session_token: String,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
    cancel: CancellationToken,
    state_tx: watch::Sender<ConnectionState>,
) {
    let mut backoff = BACKOFF_BASE;

    loop {
        state_tx.send_replace(ConnectionState::Connecting);
        let connected = tokio::select! {
            () = cancel.cancelled() => {
                state_tx.send_replace(ConnectionState::Disconnected);
                return;
            }
            result = transport.connect() => result,
        };

        let mut conn = match connected {
            Ok(conn) => conn,
            Err(err) => {
                tracing::warn!(error = %err, "chat connect failed");
                state_tx.send_replace(ConnectionState::Disconnected);
                if !idle_through_backoff(&mut outbound_rx, &cancel, backoff).await {
                    return;
                }
                backoff = next_backoff(backoff);
                continue;
            }
        };

        state_tx.send_replace(ConnectionState::Connected);
        backoff = BACKOFF_BASE;

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    state_tx.send_replace(ConnectionState::Disconnected);
                    return;
                }
                outbound = outbound_rx.recv() => {
                    let Some(text) = outbound else {
                        state_tx.send_replace(ConnectionState::Disconnected);
                        return;
                    };
                    let frame = OutboundChatFrame {
                        message: text,
                        token: session_token.clone(),
                    };
                    if let Err(err) = conn.send(frame).await {
                        // At-most-once: the frame is not retried.
                        tracing::warn!(error = %err, "chat send failed; frame dropped");
                        break;
                    }
                }
                inbound = conn.next() => {
                    match inbound {
                        Some(Ok(frame)) => {
                            store.dispatch(Action::ChatMessageReceived(ChatMessage {
                                text: frame.message,
                                author_username: frame.username,
                                author_avatar_url: frame.avatar,
                            }));
                        }
                        Some(Err(err)) => {
                            tracing::warn!(error = %err, "chat receive failed");
                            break;
                        }
                        None => {
                            tracing::info!("chat connection closed by server");
                            break;
                        }
                    }
                }
            }
        }

        state_tx.send_replace(ConnectionState::Disconnected);
        if !idle_through_backoff(&mut outbound_rx, &cancel, backoff).await {
            return;
        }
        backoff = next_backoff(backoff);
    }
}

/// Wait out the reconnect backoff. Outbound frames composed while the
/// channel is down are discarded here — queueing them would silently
/// promise a delivery guarantee the channel does not have. Returns `false`
/// when the session was cancelled.
async fn idle_through_backoff(
    outbound_rx: &mut mpsc::UnboundedReceiver<String>,
    cancel: &CancellationToken,
    backoff: Duration,
) -> bool {
    let deadline = tokio::time::sleep(backoff);
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            () = cancel.cancelled() => return false,
            () = &mut deadline => return true,
            outbound = outbound_rx.recv() => {
                if outbound.is_none() {
                    return false;
                }
                tracing::debug!("chat channel down; dropping outbound message");
            }
        }
    }
}

fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(BACKOFF_CAP)
}
