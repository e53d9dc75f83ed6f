//! Presence networking for the kart race.
//!
//! Each participant owns one record in a shared store, publishes its kart
//! motion into it every frame and watches everyone else's. There is no
//! authoritative server; the store is last-writer-wins per record.

pub mod config;
pub mod memory;
pub mod store;
pub mod sync;

pub use kart_core as core;

// Re-export key types for convenience.
pub use config::BackendConfig;
pub use memory::MemoryPresenceStore;
pub use store::{ChildEvent, Connection, ConnectionId, PresenceStore, StoreError};
pub use sync::{NetError, NetworkSync, PresenceRecord};
