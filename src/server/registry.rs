//! Live connection registry.
//!
//! Owned by the listener and shared with every connection handler. Entries are added
//! on accept and removed exactly once when the handler closes.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity assigned to an accepted connection.
pub type ConnectionId = u64;

/// What is known about a live connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub peer: Option<SocketAddr>,
    pub accepted_at: DateTime<Utc>,
}

/// Thread-safe set of live connections.
///
/// # Examples
///
/// ```
/// use bridgeport::server::ConnectionRegistry;
///
/// let registry = ConnectionRegistry::new();
/// let id = registry.register(None);
/// assert!(registry.contains(id));
///
/// assert!(registry.remove(id).is_some());
/// assert!(registry.remove(id).is_none());
/// assert!(registry.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    next_id: AtomicU64,
    live: DashMap<ConnectionId, ConnectionInfo>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a newly accepted connection and return its id.
    pub fn register(&self, peer: Option<SocketAddr>) -> ConnectionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.live.insert(
            id,
            ConnectionInfo {
                peer,
                accepted_at: Utc::now(),
            },
        );
        id
    }

    /// Stop tracking a connection. Returns `None` if it was already removed.
    pub fn remove(&self, id: ConnectionId) -> Option<ConnectionInfo> {
        self.live.remove(&id).map(|(_, info)| info)
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.live.contains_key(&id)
    }

    pub fn get(&self, id: ConnectionId) -> Option<ConnectionInfo> {
        self.live.get(&id).map(|entry| entry.value().clone())
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
