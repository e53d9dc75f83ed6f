//! The presence store abstraction.
//!
//! A store holds JSON records under slash-separated paths. Clients open a
//! connection, write records, register removals to run when the connection
//! drops, and subscribe to the children of a collection path.

use std::sync::mpsc::Receiver;
use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised by a presence store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("invalid store path {0:?}")]
    InvalidPath(String),
    #[error("connection is closed")]
    Closed,
    #[error("backend is not configured")]
    NotConfigured,
    #[error("unsupported backend {0:?}")]
    UnsupportedBackend(String),
}

/// Handle for one client connection to a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

/// Change to one child of a subscribed collection.
#[derive(Debug, Clone, PartialEq)]
pub enum ChildEvent {
    Added { key: String, value: Value },
    Changed { key: String, value: Value },
    Removed { key: String },
}

impl ChildEvent {
    /// Last path segment of the child that changed.
    pub fn key(&self) -> &str {
        match self {
            ChildEvent::Added { key, .. }
            | ChildEvent::Changed { key, .. }
            | ChildEvent::Removed { key } => key,
        }
    }
}

/// A shared, eventually consistent record store.
///
/// Writes never block on other clients. Subscribers receive events through
/// a channel that the store fills as writes land; children that already
/// exist at subscription time are delivered first as `Added`.
pub trait PresenceStore: Send + Sync {
    fn connect(&self) -> Result<ConnectionId, StoreError>;

    /// Close `connection`, running every removal registered for it.
    fn disconnect(&self, connection: ConnectionId);

    /// Replace the record at `path`.
    fn set(&self, connection: ConnectionId, path: &str, value: Value) -> Result<(), StoreError>;

    /// Merge `fields` into the record at `path`, creating it if missing.
    fn update(
        &self,
        connection: ConnectionId,
        path: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError>;

    fn remove(&self, connection: ConnectionId, path: &str) -> Result<(), StoreError>;

    /// Remove `path` when `connection` goes away.
    fn on_disconnect_remove(&self, connection: ConnectionId, path: &str)
        -> Result<(), StoreError>;

    /// Watch the direct children of `collection`. The subscription ends
    /// with the connection.
    fn subscribe_children(
        &self,
        connection: ConnectionId,
        collection: &str,
    ) -> Result<Receiver<ChildEvent>, StoreError>;
}

/// An open connection. Dropping it disconnects, so registered
/// remove-on-disconnect paths are cleared without an explicit call.
pub struct Connection {
    store: Arc<dyn PresenceStore>,
    id: ConnectionId,
}

impl Connection {
    pub fn open(store: Arc<dyn PresenceStore>) -> Result<Self, StoreError> {
        let id = store.connect()?;
        Ok(Self { store, id })
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.store.set(self.id, path, value)
    }

    pub fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        self.store.update(self.id, path, fields)
    }

    pub fn remove(&self, path: &str) -> Result<(), StoreError> {
        self.store.remove(self.id, path)
    }

    pub fn on_disconnect_remove(&self, path: &str) -> Result<(), StoreError> {
        self.store.on_disconnect_remove(self.id, path)
    }

    pub fn subscribe_children(&self, collection: &str) -> Result<Receiver<ChildEvent>, StoreError> {
        self.store.subscribe_children(self.id, collection)
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.store.disconnect(self.id);
    }
}

/// Split `path` into its collection and child key.
pub(crate) fn split_child(path: &str) -> Result<(&str, &str), StoreError> {
    validate_path(path)?;
    match path.rsplit_once('/') {
        Some((collection, key)) => Ok((collection, key)),
        None => Err(StoreError::InvalidPath(path.to_string())),
    }
}

/// Paths are non-empty segments joined by `/`.
pub(crate) fn validate_path(path: &str) -> Result<(), StoreError> {
    if path.is_empty() || path.split('/').any(|segment| segment.trim().is_empty()) {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(())
}
