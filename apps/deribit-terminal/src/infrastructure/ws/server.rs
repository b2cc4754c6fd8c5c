//! Streaming Transport Endpoint
//!
//! WebSocket server accepting streaming consumers. Inbound control frames
//! mutate the subscription registry; the connection map exposes the send
//! primitive used for control replies and broadcast pushes.
//!
//! # Lifecycle
//!
//! `start`/`stop` are guarded by an atomically-swapped running flag so
//! concurrent calls cannot double-start the listener or double-join the
//! accept loop. `stop` cancels the accept loop, which in turn drains every
//! per-connection task, and returns only once the loop has fully exited.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::{JoinHandle, JoinSet};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use super::connections::{ConnectionMap, SendError};
use super::protocol::{self, ControlFrame};
use crate::domain::subscription::{ConnectionId, SubscriptionRegistry, UnsubscribeOutcome};

// =============================================================================
// Status Types
// =============================================================================

/// Outcome of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartStatus {
    /// The listener was started.
    Started,
    /// The server was already running; nothing changed.
    AlreadyRunning,
}

/// Outcome of a stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopStatus {
    /// The listener was stopped and joined.
    Stopped,
    /// The server was not running; nothing changed.
    NotRunning,
}

/// Errors starting the listener.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener socket could not be bound.
    #[error("failed to bind listener on port {port}: {source}")]
    Bind {
        /// Requested port.
        port: u16,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

#[derive(Debug, Default)]
struct Lifecycle {
    shutdown: Option<CancellationToken>,
    listener: Option<JoinHandle<()>>,
}

// =============================================================================
// Server
// =============================================================================

/// WebSocket streaming endpoint.
#[derive(Debug)]
pub struct StreamServer {
    registry: Arc<SubscriptionRegistry>,
    connections: ConnectionMap,
    running: AtomicBool,
    next_connection_id: AtomicU64,
    lifecycle: tokio::sync::Mutex<Lifecycle>,
    local_addr: parking_lot::Mutex<Option<SocketAddr>>,
}

impl StreamServer {
    /// Create a server over a subscription registry.
    #[must_use]
    pub fn new(registry: Arc<SubscriptionRegistry>) -> Self {
        Self {
            registry,
            connections: ConnectionMap::new(),
            running: AtomicBool::new(false),
            next_connection_id: AtomicU64::new(1),
            lifecycle: tokio::sync::Mutex::new(Lifecycle::default()),
            local_addr: parking_lot::Mutex::new(None),
        }
    }

    /// The registry this server mutates on control frames.
    #[must_use]
    pub const fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }

    /// Whether the listener is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Address the listener is bound to, once started. Useful when starting
    /// on port 0.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock()
    }

    /// Number of live connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Push a text frame to one connection. This is the send primitive used
    /// by the broadcast scheduler.
    pub fn send_text(&self, id: ConnectionId, text: &str) -> Result<(), SendError> {
        self.connections.send_text(id, text)
    }

    /// Start the listener on the given port.
    ///
    /// A no-op reported as [`StartStatus::AlreadyRunning`] when already
    /// started.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] when the socket cannot be bound; the
    /// server is left stopped in that case.
    pub async fn start(self: &Arc<Self>, port: u16) -> Result<StartStatus, ServerError> {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("server is already running");
            return Ok(StartStatus::AlreadyRunning);
        }

        let listener = match TcpListener::bind(("0.0.0.0", port)).await {
            Ok(listener) => listener,
            Err(source) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(ServerError::Bind { port, source });
            }
        };

        let addr = match listener.local_addr() {
            Ok(addr) => addr,
            Err(source) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(ServerError::Bind { port, source });
            }
        };

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(accept_loop(
            Arc::clone(self),
            listener,
            shutdown.clone(),
        ));

        {
            let mut lifecycle = self.lifecycle.lock().await;
            lifecycle.shutdown = Some(shutdown);
            lifecycle.listener = Some(handle);
        }
        *self.local_addr.lock() = Some(addr);

        tracing::info!(%addr, "server started");
        Ok(StartStatus::Started)
    }

    /// Stop the listener and wait for the accept loop — and every connection
    /// task it spawned — to exit.
    ///
    /// A no-op reported as [`StopStatus::NotRunning`] when already stopped.
    pub async fn stop(&self) -> StopStatus {
        if !self.running.swap(false, Ordering::SeqCst) {
            tracing::warn!("server is not running");
            return StopStatus::NotRunning;
        }

        let (shutdown, handle) = {
            let mut lifecycle = self.lifecycle.lock().await;
            (lifecycle.shutdown.take(), lifecycle.listener.take())
        };

        if let Some(shutdown) = shutdown {
            shutdown.cancel();
        }
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        *self.local_addr.lock() = None;

        tracing::info!("server stopped");
        StopStatus::Stopped
    }

    /// Register a connection's outbound channel.
    pub(crate) fn attach(&self, id: ConnectionId, sender: UnboundedSender<Message>) {
        self.connections.insert(id, sender);
    }

    /// Allocate the next connection id.
    fn next_id(&self) -> ConnectionId {
        self.next_connection_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Handle one inbound text frame from a connection.
    fn handle_frame(&self, id: ConnectionId, text: &str) {
        match protocol::parse_control_frame(text) {
            Ok(ControlFrame::Subscribe { symbol }) => {
                self.registry.subscribe(&symbol, id);
                tracing::info!(conn = id, %symbol, "client subscribed");
                self.reply(id, &protocol::subscribed_reply(&symbol));
            }
            Ok(ControlFrame::Unsubscribe { symbol }) => {
                match self.registry.unsubscribe(&symbol, id) {
                    UnsubscribeOutcome::Removed => {
                        tracing::info!(conn = id, %symbol, "client unsubscribed");
                        self.reply(id, &protocol::unsubscribed_reply(&symbol));
                    }
                    UnsubscribeOutcome::NotSubscribed => {
                        self.reply(id, protocol::NOT_SUBSCRIBED_REPLY);
                    }
                }
            }
            Err(rejection) => {
                tracing::debug!(conn = id, frame = text, %rejection, "frame rejected");
                self.reply(id, rejection.reply());
            }
        }
    }

    fn reply(&self, id: ConnectionId, text: &str) {
        if self.connections.send_text(id, text).is_err() {
            tracing::debug!(conn = id, "reply dropped; connection gone");
        }
    }

    /// Tear down a connection's state after its task exits.
    fn detach(&self, id: ConnectionId) {
        self.connections.remove(id);
        let purged = self.registry.remove_handle(id);
        tracing::info!(conn = id, purged_symbols = purged, "client disconnected");
    }
}

// =============================================================================
// Accept Loop
// =============================================================================

async fn accept_loop(
    server: Arc<StreamServer>,
    listener: TcpListener,
    shutdown: CancellationToken,
) {
    let mut tasks = JoinSet::new();

    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    tasks.spawn(handle_connection(
                        Arc::clone(&server),
                        stream,
                        peer,
                        shutdown.clone(),
                    ));
                }
                Err(error) => {
                    tracing::warn!(%error, "accept failed");
                }
            },
        }
    }

    // Stop accepting before draining, then wait for every connection task;
    // each one watches the same shutdown token and exits promptly.
    drop(listener);
    while tasks.join_next().await.is_some() {}
    tracing::debug!("accept loop exited");
}

async fn handle_connection(
    server: Arc<StreamServer>,
    stream: TcpStream,
    peer: SocketAddr,
    shutdown: CancellationToken,
) {
    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(error) => {
            tracing::warn!(%peer, %error, "websocket handshake failed");
            return;
        }
    };

    let id = server.next_id();
    let (mut outbound, mut inbound) = ws.split();
    let (sender, mut queue) = mpsc::unbounded_channel::<Message>();
    server.attach(id, sender);
    tracing::info!(conn = id, %peer, "client connected");

    let writer = tokio::spawn(async move {
        while let Some(message) = queue.recv().await {
            if outbound.send(message).await.is_err() {
                break;
            }
        }
        let _ = outbound.close().await;
    });

    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            frame = inbound.next() => match frame {
                Some(Ok(Message::Text(text))) => server.handle_frame(id, text.as_str()),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {} // binary and ping/pong frames carry no commands
                Some(Err(error)) => {
                    tracing::debug!(conn = id, %error, "read failed");
                    break;
                }
            },
        }
    }

    // Dropping the map entry closes the writer's queue, letting it drain any
    // queued replies and shut the socket.
    server.detach(id);
    let _ = writer.await;
}

// =============================================================================
// Tests
// =============================================================================
