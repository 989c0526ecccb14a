//! Shared persistent key-value namespace.
//!
//! The store is the durable half of the synchronization substrate: a flat
//! namespace of serialized blobs, readable and writable by every process in
//! the session. There is no per-key atomicity and no locking; callers do
//! whole-value read-modify-write cycles and accept that concurrent writers
//! race (see [`crate::registry`]).
//!
//! Change notification is one-way: a handle observes writes made by *other*
//! writers of the same namespace, never its own.

mod fs;
mod memory;

pub use fs::FsStore;
pub use memory::{MemoryHandle, MemoryStore};

use bytes::Bytes;
use tokio::sync::broadcast;

/// Capacity of per-handle store event channels.
pub(crate) const EVENT_CAPACITY: usize = 64;

/// A write observed from another writer of the same namespace, carrying the
/// new serialized value.
#[derive(Debug, Clone)]
pub struct StoreEvent {
    pub key: String,
    pub value: Bytes,
}

/// One process's handle on the shared namespace.
///
/// All methods are best-effort: a missing or unreadable value reads as
/// `None`, and write failures are logged and swallowed. Durability problems
/// must degrade, never crash, because every stored value is re-derivable.
pub trait StoreBackend: Send + Sync {
    /// Read the current value for `key`.
    fn read(&self, key: &str) -> Option<Bytes>;

    /// Write `value` under `key`.
    fn write(&self, key: &str, value: Bytes);

    /// Subscribe to writes made by other writers of this namespace. Never
    /// fires for this handle's own writes.
    fn watch_external(&self) -> broadcast::Receiver<StoreEvent>;
}

/// Errors constructing a store backend. Once a backend exists, its
/// operations no longer fail loudly.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to create store directory {0}: {1}")]
    CreateDir(std::path::PathBuf, #[source] std::io::Error),
}
