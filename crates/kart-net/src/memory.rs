//! In-process presence store.
//!
//! Stores are shared by name through a global registry, so several
//! participants in one process (or one test) can race against each other
//! through `memory://<name>`.

use std::collections::{BTreeMap, HashMap};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;
use once_cell::sync::Lazy;
use serde_json::{Map, Value};

use crate::store::{split_child, validate_path, ChildEvent, ConnectionId, PresenceStore, StoreError};

static SHARED_STORES: Lazy<Mutex<HashMap<String, Arc<MemoryPresenceStore>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Get the process-wide store called `name`, creating it on first use.
pub fn shared(name: &str) -> Arc<MemoryPresenceStore> {
    let mut stores = SHARED_STORES.lock().unwrap_or_else(PoisonError::into_inner);
    stores
        .entry(name.to_string())
        .or_insert_with(|| Arc::new(MemoryPresenceStore::new()))
        .clone()
}

/// A `PresenceStore` held entirely in memory behind a mutex.
#[derive(Default)]
pub struct MemoryPresenceStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    next_connection: u64,
    /// Open connections and the paths to remove when each closes.
    connections: HashMap<ConnectionId, Vec<String>>,
    /// Collection path -> child key -> record.
    collections: HashMap<String, BTreeMap<String, Value>>,
    subscribers: Vec<Subscriber>,
}

struct Subscriber {
    connection: ConnectionId,
    collection: String,
    sender: Sender<ChildEvent>,
}

impl MemoryPresenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current record at `path`, if any.
    pub fn get(&self, path: &str) -> Option<Value> {
        let (collection, key) = split_child(path).ok()?;
        self.lock().collections.get(collection)?.get(key).cloned()
    }

    /// Number of children under `collection`.
    pub fn child_count(&self, collection: &str) -> usize {
        self.lock().collections.get(collection).map_or(0, BTreeMap::len)
    }

    pub fn open_connections(&self) -> usize {
        self.lock().connections.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Inner {
    fn check_open(&self, connection: ConnectionId) -> Result<(), StoreError> {
        if self.connections.contains_key(&connection) {
            Ok(())
        } else {
            Err(StoreError::Closed)
        }
    }

    /// Send `event` to every subscriber of `collection`, dropping the ones
    /// whose receiver has gone.
    fn notify(&mut self, collection: &str, event: ChildEvent) {
        self.subscribers
            .retain(|s| s.collection != collection || s.sender.send(event.clone()).is_ok());
    }

    fn write(&mut self, collection: &str, key: &str, value: Value) {
        let children = self.collections.entry(collection.to_string()).or_default();
        let event = if children.insert(key.to_string(), value.clone()).is_some() {
            ChildEvent::Changed {
                key: key.to_string(),
                value,
            }
        } else {
            ChildEvent::Added {
                key: key.to_string(),
                value,
            }
        };
        self.notify(collection, event);
    }

    fn delete(&mut self, collection: &str, key: &str) {
        let removed = self
            .collections
            .get_mut(collection)
            .and_then(|children| children.remove(key))
            .is_some();
        if removed {
            self.notify(
                collection,
                ChildEvent::Removed {
                    key: key.to_string(),
                },
            );
        }
    }
}

impl PresenceStore for MemoryPresenceStore {
    fn connect(&self) -> Result<ConnectionId, StoreError> {
        let mut inner = self.lock();
        inner.next_connection += 1;
        let id = ConnectionId(inner.next_connection);
        inner.connections.insert(id, Vec::new());
        debug!("memory store: connection {} opened", id.0);
        Ok(id)
    }

    fn disconnect(&self, connection: ConnectionId) {
        let mut inner = self.lock();
        let Some(pending) = inner.connections.remove(&connection) else {
            return;
        };
        inner.subscribers.retain(|s| s.connection != connection);
        for path in pending {
            if let Ok((collection, key)) = split_child(&path) {
                inner.delete(collection, key);
            }
        }
        debug!("memory store: connection {} closed", connection.0);
    }

    fn set(&self, connection: ConnectionId, path: &str, value: Value) -> Result<(), StoreError> {
        let (collection, key) = split_child(path)?;
        let mut inner = self.lock();
        inner.check_open(connection)?;
        inner.write(collection, key, value);
        Ok(())
    }

    fn update(
        &self,
        connection: ConnectionId,
        path: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let (collection, key) = split_child(path)?;
        let mut inner = self.lock();
        inner.check_open(connection)?;

        let mut record = match inner.collections.get(collection).and_then(|c| c.get(key)) {
            Some(Value::Object(existing)) => existing.clone(),
            _ => Map::new(),
        };
        record.extend(fields);
        inner.write(collection, key, Value::Object(record));
        Ok(())
    }

    fn remove(&self, connection: ConnectionId, path: &str) -> Result<(), StoreError> {
        let (collection, key) = split_child(path)?;
        let mut inner = self.lock();
        inner.check_open(connection)?;
        inner.delete(collection, key);
        Ok(())
    }

    fn on_disconnect_remove(
        &self,
        connection: ConnectionId,
        path: &str,
    ) -> Result<(), StoreError> {
        split_child(path)?;
        let mut inner = self.lock();
        let pending = inner
            .connections
            .get_mut(&connection)
            .ok_or(StoreError::Closed)?;
        if !pending.iter().any(|p| p == path) {
            pending.push(path.to_string());
        }
        Ok(())
    }

    fn subscribe_children(
        &self,
        connection: ConnectionId,
        collection: &str,
    ) -> Result<Receiver<ChildEvent>, StoreError> {
        validate_path(collection)?;
        let mut inner = self.lock();
        inner.check_open(connection)?;

        let (sender, receiver) = mpsc::channel();
        if let Some(children) = inner.collections.get(collection) {
            for (key, value) in children {
                let _ = sender.send(ChildEvent::Added {
                    key: key.clone(),
                    value: value.clone(),
                });
            }
        }
        inner.subscribers.push(Subscriber {
            connection,
            collection: collection.to_string(),
            sender,
        });
        Ok(receiver)
    }
}
