//! Process-wide registry of live connections keyed by recipient.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use super::events::LiveEvent;

/// Default per-connection outbound queue capacity.
pub const DEFAULT_CONNECTION_BUFFER: usize = 64;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier of a live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Sending half of a live connection.
///
/// The receiving half is drained by the transport (e.g. a WebSocket task).
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    tx: mpsc::Sender<Arc<LiveEvent>>,
}

impl ConnectionHandle {
    /// Create a handle with a bounded outbound queue.
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<Arc<LiveEvent>>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let id = ConnectionId(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        (Self { id, tx }, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue an event without waiting. Returns whether it was queued.
    fn deliver(&self, event: &Arc<LiveEvent>) -> bool {
        match self.tx.try_send(Arc::clone(event)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(connection = %self.id, event = %event.event, "Connection queue full, dropping event");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(connection = %self.id, event = %event.event, "Connection already closed");
                false
            }
        }
    }
}

#[derive(Default)]
struct RegistryState {
    by_recipient: HashMap<String, HashMap<ConnectionId, ConnectionHandle>>,
    owners: HashMap<ConnectionId, String>,
}

impl RegistryState {
    fn detach(&mut self, id: ConnectionId) -> Option<String> {
        let owner = self.owners.remove(&id)?;
        if let Some(connections) = self.by_recipient.get_mut(&owner) {
            connections.remove(&id);
            if connections.is_empty() {
                self.by_recipient.remove(&owner);
            }
        }
        Some(owner)
    }
}

/// Maps recipient identities to their live connections.
///
/// All access goes through an internal lock; handles are cloned out before
/// delivery so no send ever happens while the lock is held.
#[derive(Default)]
pub struct FanOutRegistry {
    state: RwLock<RegistryState>,
}

impl FanOutRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attribute a connection to a recipient.
    ///
    /// Registering the same handle for the same recipient again is a no-op.
    /// Registering it for a different recipient moves it. Returns `true` if the
    /// handle was newly attached to `recipient_id`.
    pub fn register(&self, handle: ConnectionHandle, recipient_id: &str) -> bool {
        let id = handle.id();
        let mut state = self.state.write();

        match state.owners.get(&id).cloned() {
            Some(owner) if owner == recipient_id => return false,
            Some(previous) => {
                state.detach(id);
                debug!(connection = %id, from = %previous, to = %recipient_id, "Moving connection");
            }
            None => {}
        }

        state.owners.insert(id, recipient_id.to_string());
        state
            .by_recipient
            .entry(recipient_id.to_string())
            .or_default()
            .insert(id, handle);

        debug!(connection = %id, recipient_id = %recipient_id, "Registered live connection");
        true
    }

    /// Remove a connection from whichever recipient holds it.
    ///
    /// Returns the previous owner, or `None` if the handle was not registered.
    pub fn unregister(&self, id: ConnectionId) -> Option<String> {
        let owner = self.state.write().detach(id);
        if let Some(owner) = &owner {
            debug!(connection = %id, recipient_id = %owner, "Unregistered live connection");
        }
        owner
    }

    /// Deliver an event to every connection of one recipient.
    ///
    /// Returns the number of connections that accepted the event; zero is a
    /// normal outcome for offline recipients.
    pub fn emit_to_recipient(&self, recipient_id: &str, event: &str, payload: Value) -> usize {
        let handles = self.handles_for(recipient_id);
        if handles.is_empty() {
            trace!(recipient_id = %recipient_id, event = %event, "No live connections for recipient");
            return 0;
        }
        let event = Arc::new(LiveEvent::new(event, payload));
        handles.iter().filter(|h| h.deliver(&event)).count()
    }

    /// Deliver the same event to several recipients.
    pub fn emit_to_recipients<I, S>(&self, recipient_ids: I, event: &str, payload: Value) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        recipient_ids
            .into_iter()
            .map(|id| self.emit_to_recipient(id.as_ref(), event, payload.clone()))
            .sum()
    }

    /// Deliver an event to every registered connection.
    pub fn broadcast(&self, event: &str, payload: Value) -> usize {
        let handles: Vec<ConnectionHandle> = {
            let state = self.state.read();
            state
                .by_recipient
                .values()
                .flat_map(|connections| connections.values().cloned())
                .collect()
        };
        let event = Arc::new(LiveEvent::new(event, payload));
        handles.iter().filter(|h| h.deliver(&event)).count()
    }

    /// Connection ids currently attributed to a recipient.
    pub fn connections_for(&self, recipient_id: &str) -> Vec<ConnectionId> {
        let state = self.state.read();
        let mut ids: Vec<ConnectionId> = state
            .by_recipient
            .get(recipient_id)
            .map(|connections| connections.keys().copied().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    pub fn owner_of(&self, id: ConnectionId) -> Option<String> {
        self.state.read().owners.get(&id).cloned()
    }

    pub fn connection_count(&self) -> usize {
        self.state.read().owners.len()
    }

    pub fn recipient_count(&self) -> usize {
        self.state.read().by_recipient.len()
    }

    fn handles_for(&self, recipient_id: &str) -> Vec<ConnectionHandle> {
        let state = self.state.read();
        state
            .by_recipient
            .get(recipient_id)
            .map(|connections| connections.values().cloned().collect())
            .unwrap_or_default()
    }
}
