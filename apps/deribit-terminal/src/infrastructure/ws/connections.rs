//! Connection Map
//!
//! The endpoint's send primitive: connection id → outbound message channel.
//! Each live connection has a writer task draining its channel into the
//! socket, so sending never blocks on socket I/O and a dead connection
//! surfaces as a send error rather than a stall.

use std::collections::HashMap;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tokio_tungstenite::tungstenite::Message;

use crate::domain::subscription::ConnectionId;

/// A push failed because the connection is gone or its writer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("connection {0} is not reachable")]
pub struct SendError(pub ConnectionId);

/// Registry of live outbound channels.
#[derive(Debug, Default)]
pub struct ConnectionMap {
    inner: Mutex<HashMap<ConnectionId, UnboundedSender<Message>>>,
}

impl ConnectionMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection's outbound channel.
    pub fn insert(&self, id: ConnectionId, sender: UnboundedSender<Message>) {
        self.inner.lock().insert(id, sender);
    }

    /// Drop a connection's outbound channel.
    pub fn remove(&self, id: ConnectionId) {
        self.inner.lock().remove(&id);
    }

    /// Send a text frame to one connection.
    pub fn send_text(&self, id: ConnectionId, text: &str) -> Result<(), SendError> {
        let sender = self.inner.lock().get(&id).cloned().ok_or(SendError(id))?;
        sender
            .send(Message::text(text))
            .map_err(|_| SendError(id))
    }

    /// Number of live connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether no connections are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
