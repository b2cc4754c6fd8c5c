//! Subscription Registry
//!
//! Concurrency-safe tracking of which streaming connections are interested
//! in which instruments.
//!
//! # Design
//!
//! Two indexes are kept under one lock: symbol → subscriber set, and
//! connection → subscribed symbols. The reverse index makes disconnect
//! cleanup O(symbols-of-connection) instead of a scan over every symbol
//! bucket. Invariant: a symbol key never exists with an empty subscriber
//! set — the key is removed together with its last subscriber.
//!
//! The registry tracks interest only; connection lifecycle belongs to the
//! transport endpoint. The broadcaster iterates over a [`snapshot`], never
//! over the live maps, so network calls are made without holding the lock.
//!
//! [`snapshot`]: SubscriptionRegistry::snapshot

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;

// =============================================================================
// Types
// =============================================================================

/// Unique identifier for a streaming connection.
pub type ConnectionId = u64;

/// An instrument symbol string.
pub type Symbol = String;

/// Outcome of an unsubscribe request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsubscribeOutcome {
    /// The connection was subscribed and has been removed.
    Removed,
    /// The connection was not subscribed to that symbol; nothing changed.
    NotSubscribed,
}

#[derive(Debug, Default)]
struct RegistryState {
    by_symbol: HashMap<Symbol, HashSet<ConnectionId>>,
    by_connection: HashMap<ConnectionId, HashSet<Symbol>>,
}

// =============================================================================
// Registry
// =============================================================================

/// Thread-safe symbol → subscribers mapping with a reverse index.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    state: Mutex<RegistryState>,
}

impl SubscriptionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a connection to a symbol.
    ///
    /// Idempotent: returns `true` only when the pair was newly added.
    pub fn subscribe(&self, symbol: &str, id: ConnectionId) -> bool {
        let mut state = self.state.lock();
        let newly_added = state
            .by_symbol
            .entry(symbol.to_string())
            .or_default()
            .insert(id);
        if newly_added {
            state
                .by_connection
                .entry(id)
                .or_default()
                .insert(symbol.to_string());
        }
        newly_added
    }

    /// Unsubscribe a connection from a symbol.
    ///
    /// Removing the last subscriber deletes the symbol key entirely.
    pub fn unsubscribe(&self, symbol: &str, id: ConnectionId) -> UnsubscribeOutcome {
        let mut state = self.state.lock();

        let Some(subscribers) = state.by_symbol.get_mut(symbol) else {
            return UnsubscribeOutcome::NotSubscribed;
        };
        if !subscribers.remove(&id) {
            return UnsubscribeOutcome::NotSubscribed;
        }
        if subscribers.is_empty() {
            state.by_symbol.remove(symbol);
        }

        if let Some(symbols) = state.by_connection.get_mut(&id) {
            symbols.remove(symbol);
            if symbols.is_empty() {
                state.by_connection.remove(&id);
            }
        }

        UnsubscribeOutcome::Removed
    }

    /// Remove a connection from every symbol it is subscribed to.
    ///
    /// Called on disconnect. Returns the number of symbols the connection
    /// was removed from; a no-op for unknown connections.
    pub fn remove_handle(&self, id: ConnectionId) -> usize {
        let mut state = self.state.lock();

        let Some(symbols) = state.by_connection.remove(&id) else {
            return 0;
        };

        let mut removed = 0;
        for symbol in &symbols {
            if let Some(subscribers) = state.by_symbol.get_mut(symbol) {
                if subscribers.remove(&id) {
                    removed += 1;
                }
                if subscribers.is_empty() {
                    state.by_symbol.remove(symbol);
                }
            }
        }
        removed
    }

    /// Point-in-time copy of the symbol → subscribers mapping.
    ///
    /// The broadcaster iterates over this copy so that subscriber churn is
    /// never serialized behind slow exchange calls.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<Symbol, HashSet<ConnectionId>> {
        self.state.lock().by_symbol.clone()
    }

    /// Symbols a connection is currently subscribed to.
    #[must_use]
    pub fn symbols_of(&self, id: ConnectionId) -> Vec<Symbol> {
        self.state
            .lock()
            .by_connection
            .get(&id)
            .map(|symbols| symbols.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Registry statistics.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        let state = self.state.lock();
        RegistryStats {
            symbol_count: state.by_symbol.len(),
            connection_count: state.by_connection.len(),
        }
    }
}

/// Statistics over the registry contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Number of symbols with at least one subscriber.
    pub symbol_count: usize,
    /// Number of connections with at least one subscription.
    pub connection_count: usize,
}

// =============================================================================
// Tests
// =============================================================================
